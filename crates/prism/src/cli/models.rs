//! The `prism models` command for managing AI models.

use clap::{Args, Subcommand};
use prism_core::pipeline::hash;
use prism_core::Config;
use std::path::Path;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download required models (SigLIP encoders + classifier)
    Download {
        /// Skip the auxiliary classifier model
        #[arg(long)]
        no_classifier: bool,
    },

    /// List installed models
    List,

    /// Show model directory path
    Path,
}

/// Available SigLIP vision model variants.
struct ModelVariant {
    name: &'static str,
    label: &'static str,
    repo: &'static str,
    remote_path: &'static str,
    blake3: &'static str,
}

const VISION_VARIANTS: &[ModelVariant] = &[
    ModelVariant {
        name: "siglip-base-patch16",
        label: "Base (224)",
        repo: "Xenova/siglip-base-patch16-224",
        remote_path: "onnx/vision_model.onnx",
        blake3: "05cd313b67db70acd8e800cd4c16105c3ebc4c385fe6002108d24ea806a248be",
    },
    ModelVariant {
        name: "siglip-base-patch16-384",
        label: "Base (384)",
        repo: "Xenova/siglip-base-patch16-384",
        remote_path: "onnx/vision_model.onnx",
        blake3: "9a4dcfd0c21b8e4d143652d1e566da52222605b564979723383f6012b53dd0df",
    },
];

/// Shared text models (always downloaded alongside vision models).
const TEXT_ENCODER_REPO: &str = "Xenova/siglip-base-patch16-224";
const TEXT_ENCODER_REMOTE: &str = "onnx/text_model.onnx";
const TOKENIZER_REMOTE: &str = "tokenizer.json";

/// Expected BLAKE3 checksums for shared model files.
const TEXT_ENCODER_BLAKE3: &str =
    "fe62b4096a9e5c3ce735b771472c9e3faac6ddeceebab5794a0a5ce17ee171dd";
const TOKENIZER_BLAKE3: &str = "cf171f3552992f467891b9d59be5bde1256ffe1344c62030d4bf0f87df583906";

/// Auxiliary classifier (MobileNetV2, ImageNet-1k).
const CLASSIFIER_NAME: &str = "mobilenet-v2";
const CLASSIFIER_REPO: &str = "Xenova/mobilenet_v2_1.0_224";
const CLASSIFIER_MODEL_REMOTE: &str = "onnx/model.onnx";
const CLASSIFIER_CONFIG_REMOTE: &str = "config.json";

/// Local filenames.
const VISUAL_MODEL_LOCAL_NAME: &str = "visual.onnx";
const TEXT_MODEL_LOCAL_NAME: &str = "text_model.onnx";
const TOKENIZER_LOCAL_NAME: &str = "tokenizer.json";
const CLASSIFIER_MODEL_LOCAL_NAME: &str = "model.onnx";
const CLASSIFIER_CONFIG_LOCAL_NAME: &str = "config.json";

// ── Reusable helpers ───────────────────────────────────────────────────────

/// Status of each model file on disk.
pub struct InstalledModels {
    pub vision_224: bool,
    pub vision_384: bool,
    pub text_encoder: bool,
    pub tokenizer: bool,
    pub classifier: bool,
}

impl InstalledModels {
    /// Returns true if the minimum required models are present for search.
    pub fn can_search(&self) -> bool {
        (self.vision_224 || self.vision_384) && self.text_encoder && self.tokenizer
    }
}

/// Check which models are currently installed.
pub fn check_installed(config: &Config) -> InstalledModels {
    let model_dir = config.model_dir();

    InstalledModels {
        vision_224: model_dir
            .join(VISION_VARIANTS[0].name)
            .join(VISUAL_MODEL_LOCAL_NAME)
            .exists(),
        vision_384: model_dir
            .join(VISION_VARIANTS[1].name)
            .join(VISUAL_MODEL_LOCAL_NAME)
            .exists(),
        text_encoder: model_dir.join(TEXT_MODEL_LOCAL_NAME).exists(),
        tokenizer: model_dir.join(TOKENIZER_LOCAL_NAME).exists(),
        classifier: model_dir
            .join(CLASSIFIER_NAME)
            .join(CLASSIFIER_MODEL_LOCAL_NAME)
            .exists(),
    }
}

/// Download a vision model variant by index (0 = Base 224, 1 = Base 384).
///
/// Skips already-downloaded files.
pub async fn download_vision(
    variant_idx: usize,
    config: &Config,
    client: &reqwest::Client,
) -> anyhow::Result<()> {
    let model_dir = config.model_dir();
    let variant = &VISION_VARIANTS[variant_idx];
    let variant_dir = model_dir.join(variant.name);
    let dest = variant_dir.join(VISUAL_MODEL_LOCAL_NAME);

    if dest.exists() {
        tracing::info!("{} already exists at {:?}", variant.label, dest);
        return Ok(());
    }

    std::fs::create_dir_all(&variant_dir)?;

    let url = format!(
        "https://huggingface.co/{}/resolve/main/{}",
        variant.repo, variant.remote_path
    );

    tracing::info!("Downloading {} vision encoder...", variant.label);
    tracing::info!("  Source: {}", url);
    tracing::info!("  Destination: {:?}", dest);

    download_file(client, &url, &dest, Some(variant.blake3)).await?;

    let file_size = std::fs::metadata(&dest)?.len();
    tracing::info!(
        "  {} complete ({:.1} MB)",
        variant.label,
        file_size as f64 / (1024.0 * 1024.0)
    );

    Ok(())
}

/// Download shared text encoder and tokenizer. Skips if already present.
pub async fn download_shared(config: &Config, client: &reqwest::Client) -> anyhow::Result<()> {
    let model_dir = config.model_dir();

    // Text encoder
    let text_dest = model_dir.join(TEXT_MODEL_LOCAL_NAME);
    if text_dest.exists() {
        tracing::info!("Text encoder already exists at {:?}", text_dest);
    } else {
        std::fs::create_dir_all(&model_dir)?;
        let url = format!(
            "https://huggingface.co/{}/resolve/main/{}",
            TEXT_ENCODER_REPO, TEXT_ENCODER_REMOTE
        );
        tracing::info!("Downloading text encoder (fp32)...");
        tracing::info!("  Source: {}", url);
        download_file(client, &url, &text_dest, Some(TEXT_ENCODER_BLAKE3)).await?;
        let file_size = std::fs::metadata(&text_dest)?.len();
        tracing::info!(
            "  Text encoder complete ({:.1} MB)",
            file_size as f64 / (1024.0 * 1024.0)
        );
    }

    // Tokenizer
    let tok_dest = model_dir.join(TOKENIZER_LOCAL_NAME);
    if tok_dest.exists() {
        tracing::info!("Tokenizer already exists at {:?}", tok_dest);
    } else {
        let url = format!(
            "https://huggingface.co/{}/resolve/main/{}",
            TEXT_ENCODER_REPO, TOKENIZER_REMOTE
        );
        tracing::info!("Downloading tokenizer...");
        download_file(client, &url, &tok_dest, Some(TOKENIZER_BLAKE3)).await?;
        tracing::info!("  Tokenizer complete");
    }

    Ok(())
}

/// Download the auxiliary classifier model and its label map.
pub async fn download_classifier(config: &Config, client: &reqwest::Client) -> anyhow::Result<()> {
    let classifier_dir = config.model_dir().join(CLASSIFIER_NAME);
    std::fs::create_dir_all(&classifier_dir)?;

    let model_dest = classifier_dir.join(CLASSIFIER_MODEL_LOCAL_NAME);
    if model_dest.exists() {
        tracing::info!("Classifier already exists at {:?}", model_dest);
    } else {
        let url = format!(
            "https://huggingface.co/{}/resolve/main/{}",
            CLASSIFIER_REPO, CLASSIFIER_MODEL_REMOTE
        );
        tracing::info!("Downloading MobileNetV2 classifier...");
        tracing::info!("  Source: {}", url);
        download_file(client, &url, &model_dest, None).await?;
        let file_size = std::fs::metadata(&model_dest)?.len();
        tracing::info!(
            "  Classifier complete ({:.1} MB)",
            file_size as f64 / (1024.0 * 1024.0)
        );
    }

    let config_dest = classifier_dir.join(CLASSIFIER_CONFIG_LOCAL_NAME);
    if config_dest.exists() {
        tracing::info!("Classifier label map already exists at {:?}", config_dest);
    } else {
        let url = format!(
            "https://huggingface.co/{}/resolve/main/{}",
            CLASSIFIER_REPO, CLASSIFIER_CONFIG_REMOTE
        );
        tracing::info!("Downloading classifier label map...");
        download_file(client, &url, &config_dest, None).await?;
        tracing::info!("  Label map complete");
    }

    Ok(())
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs) -> anyhow::Result<()> {
    let config = Config::load()?;

    match args.command {
        ModelsCommand::Download { no_classifier } => {
            let client = reqwest::Client::new();

            download_vision(0, &config, &client).await?;
            download_shared(&config, &client).await?;
            if no_classifier {
                tracing::info!("Skipping classifier download (--no-classifier)");
            } else {
                download_classifier(&config, &client).await?;
            }

            tracing::info!("All downloads complete.");
        }

        ModelsCommand::List => {
            let model_dir = config.model_dir();

            if !model_dir.exists() {
                println!("No models installed.");
                println!("Run `prism models download` to download required models.");
                return Ok(());
            }

            let installed = check_installed(&config);

            println!("Installed models:");
            println!("  Directory: {}\n", model_dir.display());

            println!("  Vision encoders:");
            for (variant, present) in VISION_VARIANTS
                .iter()
                .zip([installed.vision_224, installed.vision_384])
            {
                let status = if present { "ready" } else { "not installed" };
                let default_marker = if variant.name == config.embedding.model {
                    "  (default)"
                } else {
                    ""
                };
                println!("    - {:30} {:14}{}", variant.name, status, default_marker);
            }

            println!("\n  Shared:");
            let text_status = if installed.text_encoder {
                "ready"
            } else {
                "not installed"
            };
            println!("    - {:30} {}", TEXT_MODEL_LOCAL_NAME, text_status);
            let tok_status = if installed.tokenizer {
                "ready"
            } else {
                "not installed"
            };
            println!("    - {:30} {}", TOKENIZER_LOCAL_NAME, tok_status);

            println!("\n  Classifier:");
            let cls_status = if installed.classifier {
                "ready"
            } else {
                "not installed"
            };
            println!("    - {:30} {}", CLASSIFIER_NAME, cls_status);
        }

        ModelsCommand::Path => {
            let model_dir = config.model_dir();
            println!("{}", model_dir.display());
        }
    }

    Ok(())
}

/// Download a file from a URL to a local path, streaming to disk.
///
/// If `expected_blake3` is provided, the file is verified after download.
/// On checksum mismatch the corrupt file is removed and an error is returned.
async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    expected_blake3: Option<&str>,
) -> anyhow::Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let total_size = response.content_length();
    if let Some(size) = total_size {
        tracing::info!("  Size: {:.1} MB", size as f64 / (1024.0 * 1024.0));
    }

    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if let Some(total) = total_size {
            if downloaded % (50 * 1024 * 1024) < chunk.len() as u64 {
                tracing::info!(
                    "  Progress: {:.0}%",
                    downloaded as f64 / total as f64 * 100.0
                );
            }
        }
    }

    file.flush().await?;

    // Verify checksum if expected hash is provided
    if let Some(expected) = expected_blake3 {
        verify_blake3(dest, expected)?;
    }

    Ok(())
}

/// Verify a downloaded file's BLAKE3 checksum.
///
/// On mismatch, removes the corrupt file so the next run re-downloads.
fn verify_blake3(path: &Path, expected: &str) -> anyhow::Result<()> {
    let actual = hash::content_hash(path)
        .map_err(|e| anyhow::anyhow!("Checksum computation failed for {}: {e}", path.display()))?;

    if actual != expected {
        let _ = std::fs::remove_file(path);
        anyhow::bail!(
            "Checksum mismatch for {}:\n  expected: {}\n  actual:   {}\n\
             Corrupt file removed — try downloading again.",
            path.display(),
            expected,
            actual
        );
    }

    tracing::debug!("  Checksum verified: {}…", &actual[..16]);
    Ok(())
}
