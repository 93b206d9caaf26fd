//! Permission request codes and the platform permission/UI collaborator

/// Document picker round-trip for load-from-file
pub const LOAD_EXTERNAL_STORAGE: u32 = 0x101;

/// Storage permission ahead of reading a local file
pub const PERMISSION_FOR_READ_LOCAL_FILE: u32 = 0x201;

/// Storage permission ahead of downloading a file
pub const PERMISSION_FOR_DOWNLOAD_FILE: u32 = 0x202;

/// Platform permission and UI surface: two bounded confirm-and-grant
/// flows plus the document picker. Grants and picked documents come back
/// through the controller's callback methods.
pub trait ViewerHost {
    /// Is the storage permission currently granted?
    fn has_storage_permission(&self) -> bool;

    /// Should an explanation dialog precede the request?
    fn should_show_rationale(&self) -> bool;

    /// Shows the explanation dialog, then requests the permission under
    /// `request_code` if the user accepts
    fn show_permission_rationale(&mut self, request_code: u32);

    /// Requests the storage permission under `request_code`
    fn request_storage_permission(&mut self, request_code: u32);

    /// Opens the platform document picker; the chosen source comes back
    /// via `ViewerController::on_document_picked`
    fn open_document_picker(&mut self, request_code: u32);
}
