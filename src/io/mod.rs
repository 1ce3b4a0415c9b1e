/// CSV export of reports and decision sets, and candidate import.
pub mod export;
