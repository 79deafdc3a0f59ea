use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const MAX_FAILED_LOGINS: usize = 5;
const LOCKOUT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Per-IP failed-login counter shared across workers.
#[derive(Clone, Default)]
pub struct LoginRateLimiter {
    failures: Arc<Mutex<HashMap<IpAddr, Vec<Instant>>>>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the IP has hit the failure cap inside the window.
    /// Expired failures for that IP are dropped on the way.
    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        let mut map = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        let Some(cutoff) = Instant::now().checked_sub(LOCKOUT_WINDOW) else {
            return map.get(&ip).is_some_and(|f| f.len() >= MAX_FAILED_LOGINS);
        };
        let Some(failures) = map.get_mut(&ip) else {
            return false;
        };
        failures.retain(|t| *t > cutoff);
        let blocked = failures.len() >= MAX_FAILED_LOGINS;
        if failures.is_empty() {
            map.remove(&ip);
        }
        blocked
    }

    /// Record a failed login. Every IP whose failures have all expired is
    /// forgotten, so one-off failures do not accumulate.
    pub fn record_failure(&self, ip: IpAddr) {
        let now = Instant::now();
        let mut map = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cutoff) = now.checked_sub(LOCKOUT_WINDOW) {
            map.retain(|_, failures| {
                failures.retain(|t| *t > cutoff);
                !failures.is_empty()
            });
        }
        map.entry(ip).or_default().push(now);
    }

    pub fn clear(&self, ip: IpAddr) {
        let mut map = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(&ip);
    }
}
