use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

const AIRCRAFT_TYPES: [&str; 4] = ["A320", "A330", "B737", "B777"];
const ATA_CHAPTERS: [i64; 8] = [21, 24, 27, 29, 32, 34, 36, 49];
const YEARS: [i64; 3] = [2023, 2024, 2025];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len())]
    }

    /// Uniform in `[lo, hi)`, rounded to two decimals.
    fn rate(&mut self, lo: f64, hi: f64) -> f64 {
        ((lo + (hi - lo) * self.next_f64()) * 100.0).round() / 100.0
    }
}

fn write_header(sheet: &mut Worksheet, headers: &[&str]) -> Result<()> {
    let bold = Format::new().set_bold();
    for (col, name) in headers.iter().enumerate() {
        sheet.write_with_format(0, col as u16, *name, &bold)?;
    }
    Ok(())
}

/// Component alerts. The padded header and the trailing blank-headed
/// notes column are removed again on load.
fn write_component_alerts(rng: &mut SimpleRng, rows: u32) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    write_header(
        sheet,
        &[
            "YEAR",
            "QUARTER NO",
            "A/C TYPE",
            " ATA ",
            "P/N",
            "NO OF REMOVAL",
            "REMOVAL RATE",
            "REMOVAL ALERT",
            "",
        ],
    )?;

    for row in 1..=rows {
        let ata = *rng.pick(&ATA_CHAPTERS);
        let alert = rng.rate(0.5, 2.0);
        // Roughly one row in four exceeds its alert level.
        let rate = if rng.below(4) == 0 {
            alert + rng.rate(0.01, 1.0)
        } else {
            rng.rate(0.0, alert)
        };
        let part = format!("{ata}{:04}-{}", rng.below(40), rng.below(9) + 1);

        sheet.write_number(row, 0, *rng.pick(&YEARS) as f64)?;
        sheet.write_number(row, 1, (rng.below(4) + 1) as f64)?;
        sheet.write_string(row, 2, *rng.pick(&AIRCRAFT_TYPES))?;
        sheet.write_number(row, 3, ata as f64)?;
        sheet.write_string(row, 4, &part)?;
        sheet.write_number(row, 5, (rng.below(12) + 1) as f64)?;
        sheet.write_number(row, 6, rate)?;
        sheet.write_number(row, 7, alert)?;
        if rng.below(10) == 0 {
            sheet.write_string(row, 8, "see shop report")?;
        }
    }

    workbook.save("CAN.xlsx").context("writing CAN.xlsx")?;
    Ok(())
}

/// System alerts with an ETOPS flag stored as 0/1.
fn write_system_alerts(rng: &mut SimpleRng, rows: u32) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    write_header(
        sheet,
        &["YEARS", "MONTH", "A/C TYPE", "ETOPS", "ATA", "RATE", "ALERT"],
    )?;

    for row in 1..=rows {
        let aircraft = *rng.pick(&AIRCRAFT_TYPES);
        let etops = aircraft != "A320" && rng.below(3) > 0;
        let alert = rng.rate(0.2, 1.5);
        let rate = if rng.below(5) == 0 {
            alert + rng.rate(0.01, 0.8)
        } else {
            rng.rate(0.0, alert)
        };

        sheet.write_number(row, 0, *rng.pick(&YEARS) as f64)?;
        sheet.write_number(row, 1, (rng.below(12) + 1) as f64)?;
        sheet.write_string(row, 2, aircraft)?;
        sheet.write_number(row, 3, if etops { 1.0 } else { 0.0 })?;
        sheet.write_number(row, 4, *rng.pick(&ATA_CHAPTERS) as f64)?;
        sheet.write_number(row, 5, rate)?;
        sheet.write_number(row, 6, alert)?;
    }

    workbook.save("SAN.xlsx").context("writing SAN.xlsx")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let can_rows = 240;
    let san_rows = 180;
    write_component_alerts(&mut rng, can_rows)?;
    write_system_alerts(&mut rng, san_rows)?;

    println!("Wrote {can_rows} component alerts to CAN.xlsx and {san_rows} system alerts to SAN.xlsx");
    Ok(())
}
