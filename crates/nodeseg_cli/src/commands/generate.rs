//! Generate command implementation.

use nodeseg_codec::Node;
use nodeseg_core::{SegmentWriter, Stats, WriterConfig};
use rand::RngCore;
use tracing::info;

/// Channel slots between the generator and the writer thread.
const CHANNEL_CAPACITY: usize = 64;

/// Runs the generate command.
pub fn run(
    config: WriterConfig,
    count: usize,
    store_key: &str,
    value_size: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let stats = generate(config, count, store_key, value_size)?;

    print!("{}", stats.report());
    let validated = stats.validate::<Node>()?;
    info!(nodes = validated, "validated");
    Ok(())
}

fn generate(
    config: WriterConfig,
    count: usize,
    store_key: &str,
    value_size: usize,
) -> Result<Stats, Box<dyn std::error::Error>> {
    info!(out = %config.out_dir.display(), count, "generating nodes");
    let (tx, writer) = SegmentWriter::<Node>::spawn(config, CHANNEL_CAPACITY)?;

    let mut rng = rand::thread_rng();
    for block in 0..count {
        let mut key = vec![0u8; 20];
        let mut value = vec![0u8; value_size];
        rng.fill_bytes(&mut key);
        rng.fill_bytes(&mut value);
        // A send only fails once the writer has stopped; its error is
        // reported by the join below.
        if tx.send(Node::set(store_key, key, value, block as i64)).is_err() {
            break;
        }
    }
    drop(tx);

    let stats = writer.join().map_err(|_| "writer thread panicked")??;
    Ok(stats)
}
