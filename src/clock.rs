use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;

/// source of "today" for status classification and paid-date stamping
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}

/// calendar date (UTC) of the provider's current instant
impl Clock for SafeTimeProvider {
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}
