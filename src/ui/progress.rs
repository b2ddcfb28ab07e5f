use crate::scanner::PageProgress;
use crate::translator::TranslationProgress;
use crate::ui::output::format_duration;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct ProgressManager {
    multi_progress: MultiProgress,
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            enabled,
        }
    }

    pub fn create_page_progress(&self, message: &str) -> ProgressBar {
        self.create_bar(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>4}/{len:4} pages {msg}",
            message,
        )
    }

    pub fn create_translation_progress(&self, message: &str) -> ProgressBar {
        self.create_bar(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>4}/{len:4} texts {msg}",
            message,
        )
    }

    // Length is unknown until the first callback reports a total
    fn create_bar(&self, template: &str, message: &str) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi_progress.add(ProgressBar::new(0));
        pb.set_style(
            ProgressStyle::with_template(template)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

pub fn update_page_progress(pb: &ProgressBar, progress: &PageProgress) {
    pb.set_length(progress.total_pages as u64);
    pb.set_position(progress.pages_processed as u64);

    match progress.current_page {
        Some(ref page) => {
            let remaining = progress.estimated_remaining();
            if remaining.as_secs() > 0 {
                pb.set_message(format!("{} (ETA: {})", page, format_duration(remaining)));
            } else {
                pb.set_message(page.clone());
            }
        }
        None => pb.set_message("Reading pages..."),
    }
}

pub fn update_translation_progress(pb: &ProgressBar, progress: &TranslationProgress) {
    pb.set_length(progress.total_texts as u64);
    pb.set_position(progress.texts_processed as u64);

    if let Some(ref text) = progress.current_text {
        let preview: String = text.chars().take(30).collect();
        if progress.failures > 0 {
            pb.set_message(format!("{}... ({} failed)", preview, progress.failures));
        } else {
            pb.set_message(format!("{}...", preview));
        }
    }
}

pub fn finish_progress_with_summary(pb: &ProgressBar, message: &str, duration: Duration) {
    let final_message = format!("{} (completed in {})", message, format_duration(duration));
    pb.finish_with_message(final_message);
}
