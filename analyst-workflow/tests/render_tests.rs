use analyst_core::{
    AnalystError, ChartData, ChartRenderer, ChartSpec, ColumnRef, DashPattern, ImageFormat,
    LineFit, LineStyle, Measure, Rgb, DEFAULT_MAX_IMAGE_CHARS,
};
use analyst_workflow::ScatterRenderer;
use base64::{engine::general_purpose::STANDARD, Engine as _};

fn chart(format: ImageFormat) -> ChartData {
    let peaks = [1.0, 1.0, 1.0, 1.0, 5.0, 4.0, 7.0, 3.0, 8.0, 7.0];
    ChartData {
        spec: ChartSpec {
            x: Measure::column(ColumnRef::named("rank")),
            y: Measure::column(ColumnRef::named("peak")),
            filters: vec![],
            regression: Some(LineStyle {
                color: Rgb::RED,
                dash: DashPattern::Dotted,
            }),
            format,
            max_chars: None,
        },
        points: peaks
            .iter()
            .enumerate()
            .map(|(i, &p)| ((i + 1) as f64, p))
            .collect(),
        fit: Some(LineFit {
            slope: 0.7878787878787878,
            intercept: -0.5333333333333332,
        }),
    }
}

fn decode(data_uri: &str, prefix: &str) -> Vec<u8> {
    let encoded = data_uri.strip_prefix(prefix).expect("data URI prefix");
    STANDARD.decode(encoded).expect("valid base64")
}

#[test]
fn test_png_payload_under_ceiling() {
    let payload = ScatterRenderer::default()
        .render(&chart(ImageFormat::Png), DEFAULT_MAX_IMAGE_CHARS)
        .unwrap();

    assert_eq!(payload.format, ImageFormat::Png);
    assert_eq!((payload.width, payload.height), (800, 600));
    assert!(payload.encoded_len() < DEFAULT_MAX_IMAGE_CHARS);

    let bytes = decode(&payload.data_uri, "data:image/png;base64,");
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn test_webp_payload() {
    let payload = ScatterRenderer::default()
        .render(&chart(ImageFormat::Webp), DEFAULT_MAX_IMAGE_CHARS)
        .unwrap();

    let bytes = decode(&payload.data_uri, "data:image/webp;base64,");
    assert_eq!(&bytes[..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WEBP");
}

#[test]
fn test_degrades_resolution_to_fit() {
    let renderer = ScatterRenderer::default();
    let data = chart(ImageFormat::Png);
    let full = renderer.render(&data, DEFAULT_MAX_IMAGE_CHARS).unwrap();

    // The ceiling is exclusive, so the full-size image no longer fits.
    let smaller = renderer.render(&data, full.encoded_len()).unwrap();
    assert!(smaller.width < full.width);
    assert!(smaller.encoded_len() < full.encoded_len());
}

#[test]
fn test_size_exceeded_when_nothing_fits() {
    let err = ScatterRenderer::default()
        .render(&chart(ImageFormat::Png), 64)
        .unwrap_err();

    match err {
        AnalystError::SizeExceeded { limit, actual } => {
            assert_eq!(limit, 64);
            assert!(actual >= 64);
        }
        other => panic!("expected SizeExceeded, got {other:?}"),
    }
}

#[test]
fn test_single_point_renders() {
    let mut data = chart(ImageFormat::Png);
    data.points.truncate(1);
    data.fit = None;

    let payload = ScatterRenderer::new(320, 240).render(&data, DEFAULT_MAX_IMAGE_CHARS).unwrap();
    assert_eq!((payload.width, payload.height), (320, 240));
}
