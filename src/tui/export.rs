use crate::model::MarkerCollection;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;
use time::{macros::format_description, OffsetDateTime};

/// `map-markers-<UTC timestamp>.<ext>`
fn export_filename(at: OffsetDateTime, ext: &str) -> String {
    let stamp = at
        .format(format_description!(
            "[year]-[month]-[day]_[hour]-[minute]-[second]"
        ))
        .unwrap_or_else(|_| at.unix_timestamp().to_string());
    format!("map-markers-{stamp}.{ext}")
}

fn export_path(ext: &str) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().context("get current directory")?;
    Ok(current_dir.join(export_filename(OffsetDateTime::now_utc(), ext)))
}

/// Export the collection as JSON into the current directory.
/// Returns the absolute path of the exported file.
pub fn export_markers_json(markers: &MarkerCollection) -> Result<PathBuf> {
    let path = export_path("json")?;
    crate::storage::export_json(&path, markers)?;
    Ok(path)
}

/// Export the collection as CSV into the current directory.
pub fn export_markers_csv(markers: &MarkerCollection) -> Result<PathBuf> {
    let path = export_path("csv")?;
    crate::storage::export_csv(&path, markers)?;
    Ok(path)
}

/// How long a clipboard handle stays alive after a write. Clipboard managers on
/// Linux read the contents from the owning handle, so dropping it at once loses them.
const CLIPBOARD_HOLD: Duration = Duration::from_secs(2);

static CLIPBOARD: OnceLock<ClipboardWorker> = OnceLock::new();

/// Serializes clipboard writes on a dedicated thread, off the UI loop.
struct ClipboardWorker {
    jobs: std_mpsc::Sender<String>,
}

impl ClipboardWorker {
    fn spawn() -> Result<Self> {
        let (jobs, rx) = std_mpsc::channel::<String>();
        std::thread::Builder::new()
            .name("clipboard".into())
            .spawn(move || Self::serve(rx))
            .context("spawn clipboard thread")?;
        Ok(Self { jobs })
    }

    fn serve(rx: std_mpsc::Receiver<String>) {
        for text in rx {
            let written = arboard::Clipboard::new().and_then(|mut clipboard| {
                clipboard.set_text(text.as_str())?;
                Ok(clipboard)
            });
            match written {
                Ok(_held) => std::thread::sleep(CLIPBOARD_HOLD),
                Err(e) => {
                    tracing::warn!(error = %e, chars = text.chars().count(), "clipboard write failed")
                }
            }
        }
    }

    fn copy(&self, text: &str) -> Result<()> {
        self.jobs
            .send(text.to_owned())
            .map_err(|_| anyhow::anyhow!("clipboard thread has exited"))
    }
}

/// Queue `text` for the clipboard. Returns once queued.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let worker = match CLIPBOARD.get() {
        Some(worker) => worker,
        None => {
            let worker = ClipboardWorker::spawn()?;
            CLIPBOARD.get_or_init(|| worker)
        }
    };
    worker.copy(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn filename_uses_utc_timestamp() {
        assert_eq!(
            export_filename(datetime!(2024-03-05 7:08:09 UTC), "csv"),
            "map-markers-2024-03-05_07-08-09.csv"
        );
    }

    #[test]
    fn copy_fails_once_worker_is_gone() {
        let (jobs, rx) = std_mpsc::channel();
        let worker = ClipboardWorker { jobs };
        worker.copy("47.2, 39.7").unwrap();
        assert_eq!(rx.recv().unwrap(), "47.2, 39.7");
        drop(rx);
        assert!(worker.copy("again").is_err());
    }
}
