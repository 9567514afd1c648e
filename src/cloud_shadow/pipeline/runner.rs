use std::io::Write;
use std::path::Path;

use tracing::{info, instrument, warn};

use crate::cloud_shadow::{
    common::error::{DetectionError, Result},
    detection::{self, CloudShadowMasks, coverage},
    pipeline::{PipelineConfig, PipelineTimings, Timer},
    raster::{GeoTiffMaskWriter, GeoTiffReader, MaskWriter, RasterReader, SpectralImage},
};

/// Loads a multispectral raster, detects clouds and shadows, stores both masks.
pub struct CloudShadowPipeline<R: RasterReader, W: MaskWriter> {
    reader: R,
    writer: W,
    config: PipelineConfig,
}

impl CloudShadowPipeline<GeoTiffReader, GeoTiffMaskWriter> {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            reader: GeoTiffReader::new(),
            writer: GeoTiffMaskWriter,
            config,
        }
    }
}

impl<R: RasterReader, W: MaskWriter> CloudShadowPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: PipelineConfig) -> Self {
        Self {
            reader,
            writer,
            config,
        }
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 {
            return Err(DetectionError::InvalidDimensions(width, height));
        }

        if let Some(max) = self.config.max_dimension
            && (width > max || height > max)
        {
            warn!(width, height, max, "Image dimensions exceed maximum");
            return Err(DetectionError::InvalidDimensions(width, height));
        }

        Ok(())
    }

    /// Decodes `input_data` and runs detection on it.
    #[instrument(skip(self, input_data), fields(input_size = input_data.len()))]
    pub fn detect_bytes(&self, input_data: &[u8]) -> Result<(SpectralImage, CloudShadowMasks)> {
        let mut timings = PipelineTimings::new();
        self.detect_timed(input_data, &mut timings)
    }

    /// Runs the whole pipeline on in-memory input, writing each mask to its sink.
    #[instrument(skip_all, fields(input_size = input_data.len()))]
    pub fn run(
        &self,
        input_data: &[u8],
        cloud_output: &mut dyn Write,
        shadow_output: &mut dyn Write,
    ) -> Result<CloudShadowMasks> {
        let mut timings = PipelineTimings::new();
        self.run_timed(input_data, cloud_output, shadow_output, &mut timings)
    }

    pub fn run_with_timings(
        &self,
        input_data: &[u8],
        cloud_output: &mut dyn Write,
        shadow_output: &mut dyn Write,
    ) -> Result<(CloudShadowMasks, PipelineTimings)> {
        let mut timings = PipelineTimings::new();
        let masks = self.run_timed(input_data, cloud_output, shadow_output, &mut timings)?;
        Ok((masks, timings))
    }

    #[instrument(skip_all)]
    pub fn run_files<P: AsRef<Path>, Q: AsRef<Path>, S: AsRef<Path>>(
        &self,
        input_path: P,
        cloud_path: Q,
        shadow_path: S,
    ) -> Result<CloudShadowMasks> {
        let mut timings = PipelineTimings::new();
        self.run_files_timed(
            input_path.as_ref(),
            cloud_path.as_ref(),
            shadow_path.as_ref(),
            &mut timings,
        )
    }

    pub fn run_files_with_timings<P: AsRef<Path>, Q: AsRef<Path>, S: AsRef<Path>>(
        &self,
        input_path: P,
        cloud_path: Q,
        shadow_path: S,
    ) -> Result<(CloudShadowMasks, PipelineTimings)> {
        let mut timings = PipelineTimings::new();
        let masks = self.run_files_timed(
            input_path.as_ref(),
            cloud_path.as_ref(),
            shadow_path.as_ref(),
            &mut timings,
        )?;
        Ok((masks, timings))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PipelineConfig) {
        self.config = config;
    }

    fn detect_timed(
        &self,
        input_data: &[u8],
        timings: &mut PipelineTimings,
    ) -> Result<(SpectralImage, CloudShadowMasks)> {
        let image = {
            let _span = tracing::info_span!("decode_raster").entered();
            let timer = Timer::start("decode_raster");
            let image = self.reader.read_raster(input_data)?;
            let (name, duration) = timer.stop();
            timings.add_step(name, duration);
            image
        };

        {
            let _span = tracing::info_span!(
                "validate_dimensions",
                width = image.width(),
                height = image.height()
            )
            .entered();
            self.validate_dimensions(image.width(), image.height())?;
        }

        info!(
            width = image.width(),
            height = image.height(),
            bands = image.band_count(),
            element_type = %image.metadata.element_type,
            epsg = ?image.metadata.crs.as_ref().and_then(|crs| crs.epsg()),
            "Raster loaded"
        );

        let masks = {
            let _span = tracing::info_span!("detect").entered();
            let timer = Timer::start("detect");
            let masks = detection::detect(image.data.view(), &self.config.params)?;
            let (name, duration) = timer.stop();
            timings.add_step(name, duration);
            masks
        };

        Ok((image, masks))
    }

    fn run_timed(
        &self,
        input_data: &[u8],
        cloud_output: &mut dyn Write,
        shadow_output: &mut dyn Write,
        timings: &mut PipelineTimings,
    ) -> Result<CloudShadowMasks> {
        let (image, masks) = self.detect_timed(input_data, timings)?;
        let mask_metadata = image.metadata.for_mask();

        {
            let _span = tracing::info_span!("encode_cloud_mask").entered();
            let timer = Timer::start("encode_cloud_mask");
            self.writer
                .write_mask(&masks.cloud, &mask_metadata, cloud_output, &self.config.encoding)?;
            let (name, duration) = timer.stop();
            timings.add_step(name, duration);
        }

        {
            let _span = tracing::info_span!("encode_shadow_mask").entered();
            let timer = Timer::start("encode_shadow_mask");
            self.writer
                .write_mask(&masks.shadow, &mask_metadata, shadow_output, &self.config.encoding)?;
            let (name, duration) = timer.stop();
            timings.add_step(name, duration);
        }

        info!(
            cloud_coverage = coverage(&masks.cloud),
            shadow_coverage = coverage(&masks.shadow),
            total_ms = timings.total_duration().as_secs_f64() * 1000.0,
            "Cloud/shadow detection complete"
        );
        Ok(masks)
    }

    fn run_files_timed(
        &self,
        input_path: &Path,
        cloud_path: &Path,
        shadow_path: &Path,
        timings: &mut PipelineTimings,
    ) -> Result<CloudShadowMasks> {
        info!(
            input = %input_path.display(),
            cloud = %cloud_path.display(),
            shadow = %shadow_path.display(),
            "Detecting clouds and shadows"
        );

        let input_data = {
            let _span = tracing::info_span!("read_input_file").entered();
            let timer = Timer::start("read_input_file");
            let data = std::fs::read(input_path).map_err(|e| {
                DetectionError::InputReadError(format!("{}: {}", input_path.display(), e))
            })?;
            let (name, duration) = timer.stop();
            timings.add_step(name, duration);
            data
        };

        // Encode in memory first so a failed run leaves no partial files behind.
        let mut cloud_bytes = Vec::new();
        let mut shadow_bytes = Vec::new();
        let masks = self.run_timed(&input_data, &mut cloud_bytes, &mut shadow_bytes, timings)?;

        {
            let _span = tracing::info_span!("write_output_files").entered();
            let timer = Timer::start("write_output_files");
            write_file(cloud_path, &cloud_bytes)?;
            write_file(shadow_path, &shadow_bytes)?;
            let (name, duration) = timer.stop();
            timings.add_step(name, duration);
        }

        Ok(masks)
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)
        .map_err(|e| DetectionError::OutputWriteError(format!("{}: {}", path.display(), e)))
}
