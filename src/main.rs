use csd_si_rs::cloud_shadow::{CloudShadowPipeline, PipelineConfig, TiffCompression};
use csd_si_rs::logger;

use tracing::{error, info};

const DEFAULT_INPUT: &str = "input.tif";
const DEFAULT_CLOUD_OUTPUT: &str = "cloud_mask.tif";
const DEFAULT_SHADOW_OUTPUT: &str = "cloud_shadow_mask.tif";

fn main() -> anyhow::Result<()> {
    logger::init();

    info!("Starting csd_si...");

    let mut args = std::env::args().skip(1);
    let input = args.next().unwrap_or_else(|| DEFAULT_INPUT.to_string());
    let cloud_output = args.next().unwrap_or_else(|| DEFAULT_CLOUD_OUTPUT.to_string());
    let shadow_output = args.next().unwrap_or_else(|| DEFAULT_SHADOW_OUTPUT.to_string());

    let config = PipelineConfig::builder()
        .compression(TiffCompression::DeflateBalanced)
        .build();
    let pipeline = CloudShadowPipeline::new(config);

    let params = &pipeline.config().params;
    info!("Bands (R, G, B, NIR): {:?}", params.bands);
    info!("Cloud: {:?}", params.cloud);
    info!("Shadow: {:?}", params.shadow);

    match pipeline.run_files_with_timings(&input, &cloud_output, &shadow_output) {
        Ok((_, timings)) => {
            info!("Detection successful!");
            timings.log_summary();
        }
        Err(e) => {
            error!("Detection failed: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
