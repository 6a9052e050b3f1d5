pub mod ignore;

pub use ignore::ScanIgnoreRules;
