use camino::Utf8Path;

use crate::error::Result;
use crate::game::VcsClient;
use crate::models::metadata_list::MetadataList;

/// Revision information for an on-disk masterlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterlistInfo {
    pub revision_id: String,
    pub revision_date: String,
}

/// A metadata list with provenance: the repository revision it was read
/// from and the branch it tracks.
#[derive(Debug, Clone, Default)]
pub struct Masterlist {
    list: MetadataList,
    revision_id: Option<String>,
    revision_date: Option<String>,
    branch: Option<String>,
}

impl Masterlist {
    pub fn new() -> Self {
        Masterlist::default()
    }

    /// Load the masterlist document at `path`. Revision information is left
    /// unset; it is filled in by [`Masterlist::update`] or queried directly
    /// with [`Masterlist::info`].
    pub fn load(path: &Utf8Path) -> Result<Self> {
        Ok(Masterlist {
            list: MetadataList::load(path)?,
            ..Masterlist::default()
        })
    }

    /// Update the on-disk masterlist from a remote repository and reload it
    /// if its contents changed. Returns true iff the file changed on disk.
    ///
    /// On any failure the previous parsed state stays in effect; the VCS
    /// client guarantees the on-disk file is replaced only after a fully
    /// successful fetch.
    pub fn update(
        &mut self,
        vcs: &dyn VcsClient,
        path: &Utf8Path,
        url: &str,
        branch: &str,
    ) -> Result<bool> {
        tracing::info!("Updating masterlist at {} from {} ({})", path, url, branch);
        let changed = vcs.update(path, url, branch)?;

        if changed || self.revision_id.is_none() {
            let list = MetadataList::load(path)?;
            let (revision_id, revision_date) = vcs.revision(path, true)?;
            self.list = list;
            self.revision_id = Some(revision_id);
            self.revision_date = Some(revision_date);
            self.branch = Some(branch.to_string());
        }
        Ok(changed)
    }

    /// Query revision information for an on-disk masterlist without
    /// loading it.
    pub fn info(vcs: &dyn VcsClient, path: &Utf8Path, short_id: bool) -> Result<MasterlistInfo> {
        let (revision_id, revision_date) = vcs.revision(path, short_id)?;
        Ok(MasterlistInfo {
            revision_id,
            revision_date,
        })
    }

    /// True iff the on-disk masterlist matches the tip of the given branch.
    pub fn is_latest(vcs: &dyn VcsClient, path: &Utf8Path, branch: &str) -> Result<bool> {
        vcs.is_latest(path, branch)
    }

    pub fn list(&self) -> &MetadataList {
        &self.list
    }

    pub fn revision_id(&self) -> Option<&str> {
        self.revision_id.as_deref()
    }

    pub fn revision_date(&self) -> Option<&str> {
        self.revision_date.as_deref()
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }
}

impl From<MetadataList> for Masterlist {
    fn from(list: MetadataList) -> Self {
        Masterlist {
            list,
            ..Masterlist::default()
        }
    }
}
