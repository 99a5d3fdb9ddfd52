use std::collections::HashMap;

use bytes::Bytes;

/// One uploaded file. `name` is the leaf file name, without any directory part.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        UploadedFile {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// A submitted folder: its raw display name and the files it contained.
#[derive(Debug, Clone)]
pub struct FolderSubmission {
    pub display_name: String,
    pub files: Vec<UploadedFile>,
}

impl FolderSubmission {
    pub fn new(display_name: impl Into<String>, files: Vec<UploadedFile>) -> Self {
        FolderSubmission {
            display_name: display_name.into(),
            files,
        }
    }
}

/// Ordered collection of folders processed by one invocation.
#[derive(Debug, Clone, Default)]
pub struct UploadBatch {
    pub folders: Vec<FolderSubmission>,
}

impl UploadBatch {
    pub fn new(folders: Vec<FolderSubmission>) -> Self {
        UploadBatch { folders }
    }

    /// Group flat uploads by the directory that directly contains each file.
    ///
    /// Paths use `/` (browser folder uploads) or `\` separators. Uploads without
    /// any directory component cannot be attributed to a folder and are dropped.
    /// Folder order follows first appearance.
    pub fn from_uploads<I, P, B>(uploads: I) -> Self
    where
        I: IntoIterator<Item = (P, B)>,
        P: AsRef<str>,
        B: Into<Bytes>,
    {
        let mut folders: Vec<FolderSubmission> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (path, bytes) in uploads {
            let parts: Vec<&str> = path
                .as_ref()
                .split(['/', '\\'])
                .filter(|p| !p.is_empty())
                .collect();

            let [.., folder, file] = parts.as_slice() else {
                tracing::debug!(path = %path.as_ref(), "Upload has no folder component, skipping");
                continue;
            };

            let slot = *index.entry(folder.to_string()).or_insert_with(|| {
                folders.push(FolderSubmission::new(*folder, Vec::new()));
                folders.len() - 1
            });
            folders[slot].files.push(UploadedFile::new(*file, bytes));
        }

        UploadBatch { folders }
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }
}
