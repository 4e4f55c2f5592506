//! Write `sample_input.xlsx`: a transposed master sheet plus a filter sheet.

use anyhow::Context;
use rust_xlsxwriter::{Format, Workbook};

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

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    fn range(&mut self, lo: u64, hi: u64) -> u64 {
        lo + self.next_u64() % (hi - lo)
    }
}

const N_RECORDS: u16 = 24;

fn main() -> anyhow::Result<()> {
    let mut rng = SimpleRng::new(42);
    let years = [2023.0, 2024.0];
    let categories = ["A", "B", "C"];
    let regions = ["North", "South", "East"];

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    // Master sheet: one field per row, one record per column.
    let master = workbook.add_worksheet();
    master.set_name("总表")?;
    master.write_string_with_format(0, 0, "字段", &bold)?;
    for (row, field) in (1u32..).zip(["序号", "年份", "品类", "地区", "Value"]) {
        master.write_string_with_format(row, 0, field, &bold)?;
    }
    for col in 1..=N_RECORDS {
        master.write_string(0, col, format!("数据{col}"))?;
        master.write_number(1, col, f64::from(col))?;
        master.write_number(2, col, years[usize::from(col) % years.len()])?;
        master.write_string(3, col, rng.pick(&categories))?;
        master.write_string(4, col, rng.pick(&regions))?;
        master.write_number(5, col, rng.range(5, 500) as f64)?;
    }

    // Filter sheet: one condition per row, blank cells are wildcards.
    let filters = workbook.add_worksheet();
    filters.set_name("总表筛选")?;
    for (col, field) in (0u16..).zip(["年份", "品类", "地区"]) {
        filters.write_string_with_format(0, col, field, &bold)?;
    }
    let conditions: [[&str; 3]; 5] = [
        ["2024", "A", ""],
        ["2024", "", ""],
        ["", "B", "North"],
        ["", "", ""],
        ["1999", "", ""],
    ];
    for (row, condition) in (1u32..).zip(conditions) {
        for (col, value) in (0u16..).zip(condition) {
            if !value.is_empty() {
                filters.write_string(row, col, value)?;
            }
        }
    }

    let output_path = "sample_input.xlsx";
    workbook
        .save(output_path)
        .with_context(|| format!("Failed to write {output_path}"))?;

    println!(
        "Wrote {N_RECORDS} records and {} filter conditions to {output_path}",
        conditions.len()
    );
    Ok(())
}
