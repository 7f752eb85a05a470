use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::AppConfig;
use crate::log;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

const COMMON_EXECUTABLE_PATHS: &[&str] = &[
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];

const COMMON_TESSDATA_DIRS: &[&str] = &[
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
];

pub struct TesseractPaths {
    pub executable: PathBuf,
    /// `None` leaves language data lookup to tesseract itself
    pub tessdata: Option<PathBuf>,
}

/// Locates tesseract and language data for every configured language,
/// downloading missing language files into the data directory.
pub fn ensure_tesseract(config: &AppConfig) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable(config.tesseract_path.as_deref())?;
    log(&format!("Tesseract found at: {}", executable.display()));

    let languages = split_languages(&config.ocr_languages);

    if let Some(dir) = &config.tessdata_dir {
        log(&format!("Using configured tessdata: {}", dir.display()));
        return Ok(TesseractPaths {
            executable,
            tessdata: Some(dir.clone()),
        });
    }

    if let Some(dir) = find_tessdata_dir(&languages) {
        log(&format!("Using tessdata at: {}", dir.display()));
        return Ok(TesseractPaths {
            executable,
            tessdata: Some(dir),
        });
    }

    let local = crate::paths::get_tessdata_dir();
    log(&format!(
        "Language data for '{}' not found, preparing {}",
        config.ocr_languages,
        local.display()
    ));
    fs::create_dir_all(&local)?;
    for lang in &languages {
        let target = local.join(format!("{}.traineddata", lang));
        if !target.exists() {
            download_tessdata(lang, &target)?;
        }
    }

    Ok(TesseractPaths {
        executable,
        tessdata: Some(local),
    })
}

/// "eng+ita" -> ["eng", "ita"]
pub fn split_languages(languages: &str) -> Vec<String> {
    languages
        .split('+')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn has_languages(dir: &Path, languages: &[String]) -> bool {
    languages
        .iter()
        .all(|lang| dir.join(format!("{}.traineddata", lang)).exists())
}

/// Finds the Tesseract executable: configured path, then common install
/// locations, then `tesseract` on PATH.
pub fn find_tesseract_executable(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        log(&format!(
            "Configured tesseract_path does not exist: {}",
            path.display()
        ));
    }

    for path in COMMON_EXECUTABLE_PATHS {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    // Check PATH
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    Err(anyhow!(
        "Tesseract not found. Install Tesseract-OCR or set tesseract_path in config.json."
    ))
}

/// Finds a tessdata directory holding every requested language: the app's
/// own download directory, TESSDATA_PREFIX, then common system locations.
pub fn find_tessdata_dir(languages: &[String]) -> Option<PathBuf> {
    let mut candidates = vec![crate::paths::get_tessdata_dir()];

    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let prefix = PathBuf::from(prefix);
        candidates.push(prefix.join("tessdata"));
        candidates.push(prefix);
    }
    candidates.extend(COMMON_TESSDATA_DIRS.iter().map(PathBuf::from));

    candidates
        .into_iter()
        .find(|dir| has_languages(dir, languages))
}

/// Copies `<lang>.traineddata` from a system install if one has it,
/// otherwise downloads it from the tessdata repository.
fn download_tessdata(lang: &str, target: &Path) -> Result<()> {
    let file_name = format!("{}.traineddata", lang);

    for dir in COMMON_TESSDATA_DIRS {
        let source = Path::new(dir).join(&file_name);
        if source.exists() {
            log(&format!("Copying {} from: {}", file_name, source.display()));
            fs::copy(&source, target)?;
            return Ok(());
        }
    }

    let url = format!("{}/{}", TESSDATA_REPO, file_name);
    log(&format!("Downloading {}...", url));

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "miaocarb")
        .send()
        .with_context(|| format!("Failed to download {}", file_name))?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}: HTTP {}",
            file_name,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let mut file = fs::File::create(target)?;
    file.write_all(&bytes)?;

    log(&format!("Downloaded {} ({} bytes)", file_name, bytes.len()));

    Ok(())
}
