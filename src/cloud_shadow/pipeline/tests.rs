#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};
    use std::sync::{Arc, Mutex};

    use ndarray::{Array3, Axis, s};
    use tiff::encoder::TiffEncoder;
    use tiff::encoder::colortype::Gray32Float;

    use crate::cloud_shadow::common::error::{DetectionError, Result};
    use crate::cloud_shadow::detection::DetectionParams;
    use crate::cloud_shadow::pipeline::{CloudShadowPipeline, PipelineConfig};
    use crate::cloud_shadow::raster::geo_tags::{self, tag};
    use crate::cloud_shadow::raster::{
        ElementType, GeoTiffReader, GeoTransform, Mask, MaskEncoding, MaskWriter, RasterMetadata,
        RasterReader, SpectralImage, TiffCompression,
    };

    struct MockReader {
        should_fail: bool,
        mock_image: Option<SpectralImage>,
    }

    impl RasterReader for MockReader {
        fn read_raster(&self, _data: &[u8]) -> Result<SpectralImage> {
            if self.should_fail {
                return Err(DetectionError::DecodeError("Mock decode error".to_string()));
            }
            Ok(self.mock_image.clone().unwrap_or_else(|| scene_image(16)))
        }
    }

    type Written = Arc<Mutex<Vec<(Mask, RasterMetadata)>>>;

    struct MockWriter {
        should_fail: bool,
        written: Written,
    }

    impl MaskWriter for MockWriter {
        fn write_mask(
            &self,
            mask: &Mask,
            metadata: &RasterMetadata,
            _output: &mut dyn Write,
            _encoding: &MaskEncoding,
        ) -> Result<()> {
            if self.should_fail {
                return Err(DetectionError::EncodeError("Mock encode error".to_string()));
            }
            self.written.lock().unwrap().push((mask.clone(), metadata.clone()));
            Ok(())
        }
    }

    fn scene_data(size: usize) -> Array3<f64> {
        let mut data = Array3::from_elem((size, size, 4), 100.0);
        data.slice_mut(s![1..5, 1..5, ..]).fill(300.0);
        data.slice_mut(s![5..9, 5..9, ..]).fill(10.0);
        data
    }

    fn scene_image(size: usize) -> SpectralImage {
        let mut metadata = RasterMetadata::new(size, size, 4, ElementType::F32);
        metadata.geo_transform = Some(GeoTransform::north_up(1000.0, 2000.0, 10.0, -10.0));
        SpectralImage {
            data: scene_data(size),
            metadata,
        }
    }

    fn scene_params() -> DetectionParams {
        DetectionParams::builder()
            .t1(0.5)
            .t2(0.5)
            .search_window(9, 9)
            .cloud_kernel(1)
            .shadow_kernel(1)
            .build()
    }

    fn mock_pipeline(
        reader_fails: bool,
        writer_fails: bool,
        image: Option<SpectralImage>,
        config: PipelineConfig,
    ) -> (CloudShadowPipeline<MockReader, MockWriter>, Written) {
        let written: Written = Arc::new(Mutex::new(Vec::new()));
        let reader = MockReader { should_fail: reader_fails, mock_image: image };
        let writer = MockWriter { should_fail: writer_fails, written: written.clone() };
        (CloudShadowPipeline::with_custom(reader, writer, config), written)
    }

    fn scene_config() -> PipelineConfig {
        PipelineConfig::builder().params(scene_params()).build()
    }

    /// Encodes `data` as one Gray32Float page per band with a north-up transform.
    fn encode_geotiff(data: &Array3<f64>) -> Vec<u8> {
        let (height, width, bands) = data.dim();
        let mut buffer = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer)).unwrap();
            for b in 0..bands {
                let plane: Vec<f32> = data.index_axis(Axis(2), b).iter().map(|&v| v as f32).collect();
                let mut image = encoder
                    .new_image::<Gray32Float>(width as u32, height as u32)
                    .unwrap();
                if b == 0 {
                    image
                        .encoder()
                        .write_tag(tag(geo_tags::MODEL_PIXEL_SCALE), &[10.0f64, 10.0, 0.0][..])
                        .unwrap();
                    image
                        .encoder()
                        .write_tag(
                            tag(geo_tags::MODEL_TIEPOINT),
                            &[0.0f64, 0.0, 0.0, 1000.0, 2000.0, 0.0][..],
                        )
                        .unwrap();
                }
                image.write_data(&plane).unwrap();
            }
        }
        buffer
    }

    #[test]
    fn test_config_builder() {
        let config = PipelineConfig::builder()
            .params(scene_params())
            .compression(TiffCompression::Lzw)
            .predictor(Some(2))
            .validate_dimensions(false)
            .max_dimension(Some(10000))
            .build();

        assert_eq!(config.params, scene_params());
        assert!(matches!(config.encoding.compression, TiffCompression::Lzw));
        assert_eq!(config.encoding.predictor, Some(2));
        assert!(!config.validate_dimensions);
        assert_eq!(config.max_dimension, Some(10000));
    }

    #[test]
    fn test_successful_run_writes_both_masks() {
        let (pipeline, written) = mock_pipeline(false, false, None, scene_config());

        let mut cloud_out = Vec::new();
        let mut shadow_out = Vec::new();
        let masks = pipeline.run(b"fake raster", &mut cloud_out, &mut shadow_out).unwrap();

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].0, masks.cloud);
        assert_eq!(written[1].0, masks.shadow);

        for (_, metadata) in written.iter() {
            assert_eq!(metadata.band_count, 1);
            assert_eq!(metadata.element_type, ElementType::U8);
            assert_eq!(
                metadata.geo_transform,
                Some(GeoTransform::north_up(1000.0, 2000.0, 10.0, -10.0))
            );
        }

        assert_eq!(masks.cloud.slice(s![1..5, 1..5]), Mask::ones((4, 4)));
        assert_eq!(masks.shadow.slice(s![5..9, 5..9]), Mask::ones((4, 4)));
    }

    #[test]
    fn test_reader_failure() {
        let (pipeline, written) = mock_pipeline(true, false, None, scene_config());

        let result = pipeline.run(b"fake raster", &mut Vec::new(), &mut Vec::new());

        assert!(matches!(result.unwrap_err(), DetectionError::DecodeError(_)));
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_writer_failure() {
        let (pipeline, _) = mock_pipeline(false, true, None, scene_config());

        let result = pipeline.run(b"fake raster", &mut Vec::new(), &mut Vec::new());

        assert!(matches!(result.unwrap_err(), DetectionError::EncodeError(_)));
    }

    #[test]
    fn test_invalid_params_stop_before_writing() {
        let config = PipelineConfig::builder()
            .params(DetectionParams::builder().bands(1, 2, 3, 7).build())
            .build();
        let (pipeline, written) = mock_pipeline(false, false, None, config);

        let result = pipeline.run(b"fake raster", &mut Vec::new(), &mut Vec::new());

        assert!(matches!(
            result.unwrap_err(),
            DetectionError::InvalidBandIndex { index: 7, band_count: 4, .. }
        ));
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dimension_validation_failure() {
        let config = PipelineConfig::builder()
            .params(scene_params())
            .validate_dimensions(true)
            .max_dimension(Some(12))
            .build();
        let (pipeline, _) = mock_pipeline(false, false, Some(scene_image(16)), config);

        let result = pipeline.detect_bytes(b"fake raster");

        assert!(matches!(result.unwrap_err(), DetectionError::InvalidDimensions(16, 16)));
    }

    #[test]
    fn test_dimension_validation_disabled() {
        let config = PipelineConfig::builder()
            .params(scene_params())
            .validate_dimensions(false)
            .max_dimension(Some(12))
            .build();
        let (pipeline, _) = mock_pipeline(false, false, Some(scene_image(16)), config);

        assert!(pipeline.detect_bytes(b"fake raster").is_ok());
    }

    #[test]
    fn test_run_with_timings_records_steps() {
        let (pipeline, _) = mock_pipeline(false, false, None, scene_config());

        let (_, timings) = pipeline
            .run_with_timings(b"fake raster", &mut Vec::new(), &mut Vec::new())
            .unwrap();

        let names: Vec<&str> = timings.steps().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["decode_raster", "detect", "encode_cloud_mask", "encode_shadow_mask"]
        );
    }

    #[test]
    fn test_set_config() {
        let (mut pipeline, _) = mock_pipeline(false, false, None, PipelineConfig::default());
        pipeline.set_config(scene_config());
        assert_eq!(pipeline.config().params, scene_params());
    }

    #[test]
    fn test_run_files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scene.tif");
        let cloud_path = dir.path().join("cloud_mask.tif");
        let shadow_path = dir.path().join("cloud_shadow_mask.tif");
        std::fs::write(&input, encode_geotiff(&scene_data(16))).unwrap();

        let pipeline = CloudShadowPipeline::new(scene_config());
        let (masks, timings) = pipeline
            .run_files_with_timings(&input, &cloud_path, &shadow_path)
            .unwrap();
        assert!(timings.get_step("read_input_file").is_some());
        assert!(timings.get_step("write_output_files").is_some());

        for (path, expected) in [(&cloud_path, &masks.cloud), (&shadow_path, &masks.shadow)] {
            let reloaded = GeoTiffReader::new().read_raster(&std::fs::read(path).unwrap()).unwrap();
            assert_eq!(reloaded.metadata.band_count, 1);
            assert_eq!(reloaded.metadata.element_type, ElementType::U8);
            assert_eq!(
                reloaded.metadata.geo_transform,
                Some(GeoTransform::north_up(1000.0, 2000.0, 10.0, -10.0))
            );
            let plane = reloaded.data.index_axis(Axis(2), 0).mapv(|v| v as u8);
            assert_eq!(&plane, expected);
        }

        assert_eq!(masks.cloud.iter().filter(|&&v| v == 1).count(), 16);
        assert_eq!(masks.shadow.iter().filter(|&&v| v == 1).count(), 16);
    }

    #[test]
    fn test_run_files_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let cloud_path = dir.path().join("cloud.tif");
        let shadow_path = dir.path().join("shadow.tif");

        let pipeline = CloudShadowPipeline::new(PipelineConfig::default());
        let result = pipeline.run_files(dir.path().join("missing.tif"), &cloud_path, &shadow_path);

        assert!(matches!(result.unwrap_err(), DetectionError::InputReadError(_)));
        assert!(!cloud_path.exists());
        assert!(!shadow_path.exists());
    }

    #[test]
    fn test_failed_detection_leaves_no_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scene.tif");
        let cloud_path = dir.path().join("cloud.tif");
        let shadow_path = dir.path().join("shadow.tif");
        std::fs::write(&input, encode_geotiff(&scene_data(16))).unwrap();

        let config = PipelineConfig::builder()
            .params(DetectionParams::builder().cloud_kernel(2).build())
            .build();
        let result = CloudShadowPipeline::new(config).run_files(&input, &cloud_path, &shadow_path);

        assert!(matches!(result.unwrap_err(), DetectionError::InvalidKernelSize { .. }));
        assert!(!cloud_path.exists());
        assert!(!shadow_path.exists());
    }
}
