use chrono::{DateTime, Utc};

pub(crate) mod helper {
    #[cfg(not(test))]
    pub use super::get_utc_now;
    #[cfg(test)]
    pub use super::mock_chrono::{get_utc_now, set_mock_now};
}


#[cfg(not(test))]
pub fn get_utc_now() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::helper::{get_utc_now, set_mock_now};

    #[test]
    fn mocked_clock() {
        set_mock_now(1_700_000_000);
        assert_eq!(get_utc_now().timestamp(), 1_700_000_000);
        set_mock_now(0);
        assert_eq!(get_utc_now().timestamp(), 0);
    }
}
