use std::time::{Duration, Instant};

/// Snapshot handed to progress callbacks while pages are processed.
#[derive(Debug, Clone)]
pub struct PageProgress {
    pub pages_processed: usize,
    pub total_pages: usize,
    pub current_page: Option<String>,
    pub start_time: Instant,
}

impl PageProgress {
    pub fn new(total_pages: usize) -> Self {
        Self {
            pages_processed: 0,
            total_pages,
            current_page: None,
            start_time: Instant::now(),
        }
    }

    pub fn update_page(&mut self, page: String) {
        self.pages_processed += 1;
        self.current_page = Some(page);
    }

    pub fn percentage(&self) -> f64 {
        if self.total_pages == 0 {
            0.0
        } else {
            (self.pages_processed as f64 / self.total_pages as f64) * 100.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn estimated_remaining(&self) -> Duration {
        if self.pages_processed == 0 {
            return Duration::from_secs(0);
        }

        let rate = self.pages_processed as f64 / self.elapsed().as_secs_f64();
        let remaining = self.total_pages.saturating_sub(self.pages_processed);

        if rate > 0.0 && rate.is_finite() {
            Duration::from_secs_f64(remaining as f64 / rate)
        } else {
            Duration::from_secs(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_tracking() {
        let mut progress = PageProgress::new(4);
        assert_eq!(progress.percentage(), 0.0);
        assert_eq!(progress.estimated_remaining(), Duration::from_secs(0));

        progress.update_page("page_1.xml".to_string());
        progress.update_page("page_2.xml".to_string());

        assert_eq!(progress.pages_processed, 2);
        assert_eq!(progress.percentage(), 50.0);
        assert_eq!(progress.current_page.as_deref(), Some("page_2.xml"));
    }

    #[test]
    fn test_empty_document_percentage() {
        let progress = PageProgress::new(0);
        assert_eq!(progress.percentage(), 0.0);
    }
}
