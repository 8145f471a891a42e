use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to create a new release.
pub struct CreateReleaseRequest {
    pub tag: String,
    pub title: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A created release and where its assets are uploaded.
pub struct ReleaseHandle {
    pub id: u64,
    pub html_url: String,
    /// Upload target, possibly carrying a `{?name,label}` URI template.
    pub upload_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Request to attach a local file to a release.
pub struct UploadArtifactRequest {
    pub handle: ReleaseHandle,
    pub local_path: PathBuf,
    pub display_name: String,
}
