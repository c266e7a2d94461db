// indicatif is only used for the csv load; it draws nothing when stderr is not a tty
use {
    std::time::Instant,
    tracing::info,
};

pub struct Progress {
    message: String,
    started_at: Instant,
    reported_at: Instant,
    total_processed: u64,
}

impl Progress {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            started_at: Instant::now(),
            reported_at: Instant::now(),
            total_processed: 0,
        }
    }

    pub fn update(&mut self) -> bool {
        self.total_processed += 1;

        let now = Instant::now();
        if (now - self.reported_at).as_millis() >= 5_000 {
            self.reported_at = now;
            self.report(now);
            true
        } else {
            false
        }
    }

    pub fn finish(&self) {
        self.report(Instant::now());
    }

    pub fn total_processed(&self) -> u64 {
        self.total_processed
    }

    fn report(&self, now: Instant) {
        let elapsed = (now - self.started_at).as_secs_f32().max(f32::EPSILON);
        let rate = (self.total_processed as f32) / elapsed;
        info!("{}: {} total ({:.2}/second)", self.message, self.total_processed, rate);
    }
}
