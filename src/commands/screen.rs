//! Screen OCR (Vision framework via a Swift snippet) and screen recording.

use crate::error::Result;
use crate::platform;
use crate::script::{self, sanitize, Dialect, Invocation};
use clap::Subcommand;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Subcommand, Debug)]
pub enum Screen {
    /// Extract text from the screen using the macOS Vision framework
    Ocr {
        /// OCR a specific screen region (x,y,w,h)
        #[arg(long)]
        region: Option<String>,
        /// OCR an image file instead of the screen
        #[arg(long)]
        file: Option<PathBuf>,
        /// Output as JSON with bounding boxes and confidence
        #[arg(long)]
        json: bool,
    },
    /// Record the screen for a given duration
    Record {
        /// Output file path (.mov)
        #[arg(short, long)]
        output: PathBuf,
        /// Recording duration in seconds
        #[arg(long, default_value_t = 10)]
        duration: u32,
    },
}

const OCR_IMPORTS: &str = "import Foundation\nimport Vision\nimport AppKit\n";

/// Recognition body; imports and the image path binding come first.
const OCR_BODY: &str = r##"
let url = URL(fileURLWithPath: imagePath)
guard let image = NSImage(contentsOf: url),
      let cgImage = image.cgImage(forProposedRect: nil, context: nil, hints: nil) else {
    fputs("Error: cannot load image\n", stderr)
    exit(1)
}

let req = VNRecognizeTextRequest()
req.recognitionLevel = .accurate
req.usesLanguageCorrection = true

try VNImageRequestHandler(cgImage: cgImage, options: [:]).perform([req])

guard let observations = req.results else { exit(0) }
var items: [[String: Any]] = []
for obs in observations {
    guard let candidate = obs.topCandidates(1).first else { continue }
    let bb = obs.boundingBox
    items.append([
        "text": candidate.string,
        "confidence": obs.confidence,
        "x": bb.origin.x,
        "y": bb.origin.y,
        "width": bb.width,
        "height": bb.height
    ])
}
if let data = try? JSONSerialization.data(withJSONObject: items, options: .prettyPrinted),
   let str = String(data: data, encoding: .utf8) {
    print(str)
}
"##;

impl Screen {
    pub fn run(self) -> Result<()> {
        platform::ensure_macos()?;
        match self {
            Screen::Ocr { region, file, json } => ocr(region.as_deref(), file, json),
            Screen::Record { output, duration } => record(&output, duration),
        }
    }
}

fn ocr(region: Option<&str>, file: Option<PathBuf>, json: bool) -> Result<()> {
    let (image_path, capture) = match file {
        Some(path) => (path, false),
        None => {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0);
            let path = std::env::temp_dir().join(format!("mctrl_ocr_{}.png", nanos));
            let path_str = path.to_string_lossy().into_owned();
            let mut args: Vec<&str> = vec!["-x"];
            if let Some(region) = region {
                args.push("-R");
                args.push(region);
            }
            args.push(&path_str);
            script::shell("screencapture", &args)?;
            (path, true)
        }
    };

    let source = format!(
        "{}let imagePath = {}\n{}",
        OCR_IMPORTS,
        sanitize::quoted(&image_path.to_string_lossy()),
        OCR_BODY
    );
    let result = script::swift(&source);

    // The capture only exists to feed recognition; never leave it behind.
    if capture {
        let _ = std::fs::remove_file(&image_path);
    }
    let output = result?;

    if json {
        println!("{}", output);
    } else {
        match serde_json::from_str::<serde_json::Value>(&output) {
            Ok(serde_json::Value::Array(items)) => {
                for item in items {
                    if let Some(text) = item.get("text").and_then(|t| t.as_str()) {
                        println!("{}", text);
                    }
                }
            }
            _ => println!("{}", output),
        }
    }
    Ok(())
}

fn record(output: &PathBuf, duration: u32) -> Result<()> {
    println!("Recording for {}s to {}...", duration, output.display());
    let duration_arg = duration.to_string();
    let out_str = output.to_string_lossy().into_owned();
    // The tool legitimately runs for the whole recording; pad the limit
    // instead of using the shell default.
    Invocation::new(Dialect::Shell, "screencapture")
        .args(["-v", "-V", &duration_arg, &out_str])
        .timeout(Duration::from_secs(u64::from(duration) + 30))
        .run()?;
    println!("Saved: {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ocr_source_binds_the_image_path_as_a_literal() {
        let source = format!(
            "{}let imagePath = {}\n{}",
            OCR_IMPORTS,
            sanitize::quoted("/tmp/shot \"x\".png"),
            OCR_BODY
        );
        assert!(source.starts_with("import Foundation"));
        assert!(source.contains("let imagePath = \"/tmp/shot \\\"x\\\".png\""));
        assert!(source.contains("VNRecognizeTextRequest"));
    }

    #[test]
    fn ocr_text_extraction_reads_the_text_fields() {
        let raw = r#"[{"text": "Hello", "confidence": 0.98}, {"text": "World"}]"#;
        let value: serde_json::Value = serde_json::from_str(raw).unwrap();
        let texts: Vec<&str> = value
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|i| i.get("text").and_then(|t| t.as_str()))
            .collect();
        assert_eq!(texts, vec!["Hello", "World"]);
    }
}
