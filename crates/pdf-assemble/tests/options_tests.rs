use pdf_assemble::*;

#[test]
fn test_default_options_are_valid() {
    let options = AssemblyOptions::default();
    assert!(options.validate().is_ok());
    assert_eq!(options.render_dpi, 200.0);
    assert_eq!(options.jpeg_quality, 92);
    assert_eq!(options.image_paper_size, PaperSize::A4);
}

#[test]
fn test_validation_render_dpi() {
    let mut options = AssemblyOptions::default();

    options.render_dpi = 0.0;
    assert!(options.validate().is_err());

    options.render_dpi = 5000.0;
    assert!(options.validate().is_err());

    options.render_dpi = 72.0;
    assert!(options.validate().is_ok());
}

#[test]
fn test_validation_jpeg_quality() {
    let mut options = AssemblyOptions::default();

    options.jpeg_quality = 0;
    match options.validate() {
        Err(AssemblyError::Config(msg)) => assert!(msg.contains("JPEG quality")),
        _ => panic!("Expected Config error"),
    }

    options.jpeg_quality = 100;
    assert!(options.validate().is_ok());
}

#[test]
fn test_validation_image_margin() {
    let mut options = AssemblyOptions::default();

    options.image_margin_mm = -1.0;
    assert!(options.validate().is_err());

    // A4 is 210mm wide
    options.image_margin_mm = 105.0;
    assert!(options.validate().is_err());

    options.image_margin_mm = 0.0;
    assert!(options.validate().is_ok());

    options.image_paper_size = PaperSize::Custom {
        width_mm: 0.0,
        height_mm: 100.0,
    };
    assert!(options.validate().is_err());
}

#[test]
fn test_image_page_size() {
    let mut options = AssemblyOptions::default();
    options.image_paper_size = PaperSize::Letter;
    let (w, h) = options.image_page_size_pt();
    assert!((w - 612.0).abs() < 0.01);
    assert!((h - 792.0).abs() < 0.01);

    options.image_orientation = Orientation::Landscape;
    let (w, h) = options.image_page_size_pt();
    assert!(w > h);
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn test_options_save_and_load() {
    use tempfile::NamedTempFile;

    let options = AssemblyOptions {
        render_dpi: 150.0,
        jpeg_quality: 80,
        image_paper_size: PaperSize::Custom {
            width_mm: 100.0,
            height_mm: 150.0,
        },
        image_orientation: Orientation::Landscape,
        image_margin_mm: 5.0,
        compress_output: false,
    };

    let temp = NamedTempFile::new().unwrap();
    options.save(temp.path()).await.unwrap();

    let loaded = AssemblyOptions::load(temp.path()).await.unwrap();
    assert_eq!(loaded, options);
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn test_partial_config_uses_defaults() {
    use tempfile::NamedTempFile;

    let temp = NamedTempFile::new().unwrap();
    std::fs::write(temp.path(), r#"{ "render_dpi": 300.0 }"#).unwrap();

    let loaded = AssemblyOptions::load(temp.path()).await.unwrap();
    assert_eq!(loaded.render_dpi, 300.0);
    assert_eq!(loaded.jpeg_quality, 92);
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn test_invalid_config_is_rejected() {
    use tempfile::NamedTempFile;

    let temp = NamedTempFile::new().unwrap();
    std::fs::write(temp.path(), "not json").unwrap();
    assert!(matches!(
        AssemblyOptions::load(temp.path()).await,
        Err(AssemblyError::Config(_))
    ));

    std::fs::write(temp.path(), r#"{ "jpeg_quality": 0 }"#).unwrap();
    assert!(matches!(
        AssemblyOptions::load(temp.path()).await,
        Err(AssemblyError::Config(_))
    ));
}
