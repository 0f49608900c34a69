//! Session reports: writing them to disk and sending them on.

pub mod sender;
pub mod writer;

pub use sender::{
    workout_subject, Attachment, MailComposer, MailError, MailMessage, OutboxComposer,
    ReportSender,
};
pub use writer::{
    list_reports, normalize_label, read_report, report_stem, ReportDocument, ReportError,
    ReportFile, ReportWriter, UNKNOWN_EXERCISE,
};
