//! Capture tool command line.

use std::path::Path;

use streamlapse_config::Config;

/// Arguments for one single-frame grab into `output`.
///
/// Configured common flags come first, then
/// `-i <url> -f image2 -vcodec mjpeg -q:v <quality> -vframes 1 <output>`.
pub fn capture_args(config: &Config, output: &Path) -> Vec<String> {
    let stream = &config.stream;
    let mut args = stream.common_args.clone();
    args.extend(
        [
            "-i",
            stream.url.as_str(),
            "-f",
            "image2",
            "-vcodec",
            "mjpeg",
            "-q:v",
            stream.quality.as_str(),
            "-vframes",
            "1",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    args.push(output.to_string_lossy().into_owned());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_capture_args_order() {
        let mut config = Config::default();
        config.stream.url = "rtsp://camera.local/live".to_string();
        config.stream.common_args = vec!["-hide_banner".to_string(), "-y".to_string()];
        config.stream.quality = "4".to_string();

        let args = capture_args(&config, &PathBuf::from("/out/pl-x.jpg.part"));
        assert_eq!(
            args,
            vec![
                "-hide_banner",
                "-y",
                "-i",
                "rtsp://camera.local/live",
                "-f",
                "image2",
                "-vcodec",
                "mjpeg",
                "-q:v",
                "4",
                "-vframes",
                "1",
                "/out/pl-x.jpg.part",
            ]
        );
    }

    #[test]
    fn test_capture_args_default_flags() {
        let config = Config::default();
        let args = capture_args(&config, Path::new("out.part"));
        assert_eq!(&args[..6], config.stream.common_args.as_slice());
        assert_eq!(args.last().map(String::as_str), Some("out.part"));
    }
}
