use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray, StringDictionaryBuilder};
use arrow::datatypes::{DataType, Field, Int32Type, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

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

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Write a synthetic observation table: progenitor cells branching into
/// three lineages, with cluster labels for every cell and terminal-state
/// labels only for the most mature ones.
fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let n_cells = 600;
    let lineages = ["Alpha", "Beta", "Delta"];

    let mut index: Vec<String> = Vec::with_capacity(n_cells);
    let mut latent_time: Vec<f64> = Vec::with_capacity(n_cells);
    let mut clusters = StringDictionaryBuilder::<Int32Type>::new();
    let mut terminal_states = StringDictionaryBuilder::<Int32Type>::new();

    for i in 0..n_cells {
        let lineage = rng.pick(&lineages);
        let t = (rng.next_f64() + rng.gauss(0.0, 0.02)).clamp(0.0, 1.0);

        index.push(format!("cell_{i}"));
        latent_time.push(t);

        if t < 0.3 {
            clusters.append_value("Progenitor");
        } else {
            clusters.append_value(lineage);
        }

        if t > 0.85 {
            // Alpha ends in two nearby terminal states
            let state = if lineage == "Alpha" {
                rng.pick(&["Alpha_1", "Alpha_2"]).to_string()
            } else {
                lineage.to_string()
            };
            terminal_states.append_value(state);
        } else {
            terminal_states.append_null();
        }
    }

    let dictionary = DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8));
    let schema = Arc::new(Schema::new(vec![
        Field::new("index", DataType::Utf8, false),
        Field::new("clusters", dictionary.clone(), false),
        Field::new("terminal_states", dictionary, true),
        Field::new("latent_time", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(index)),
            Arc::new(clusters.finish()),
            Arc::new(terminal_states.finish()),
            Arc::new(Float64Array::from(latent_time)),
        ],
    )
    .context("creating record batch")?;

    // Write Parquet
    let output_path = "sample_obs.parquet";
    let file = std::fs::File::create(output_path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;

    log::info!("Wrote {n_cells} observations to {output_path}");
    println!("Wrote {n_cells} observations to {output_path}");
    Ok(())
}
