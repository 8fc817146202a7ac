pub mod domain;
pub mod ports;
pub mod validation;

pub use domain::{
    format_file_size, Answer, CandidateFile, Document, DocumentId, DocumentReceipt, DocumentStatus,
    Message, PageCursor, Role, SummaryRequest, SummaryScope, SummaryStatus,
};
pub use ports::{
    DocumentContentService, DocumentUploadService, PortError, PortResult, QuestionAnsweringService,
    SummaryService,
};
pub use validation::{Rejection, UploadConstraints, Validator};
