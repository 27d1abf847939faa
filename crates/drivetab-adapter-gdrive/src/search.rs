//! Folder listing and the recursive file search.

use std::collections::HashSet;

use drivetab_core::{DriveItem, FolderEntry, FoundFile, Result, SearchRequest};

use crate::api::{DriveApi, children_query, folders_query};

/// Folders offered in the picker, sorted by name.
///
/// Folders sharing a name are all kept; they differ by id.
pub async fn list_folders<A>(api: &A, root_only: bool) -> Result<Vec<FolderEntry>>
where
    A: DriveApi + ?Sized,
{
    let mut folders: Vec<FolderEntry> = api
        .list(&folders_query(root_only))
        .await?
        .into_iter()
        .filter(DriveItem::is_folder)
        .map(|item| FolderEntry {
            id: item.id,
            name: item.name,
        })
        .collect();
    folders.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::debug!(count = folders.len(), root_only, "listed folders");
    Ok(folders)
}

/// A folder whose children are being walked.
struct Level {
    children: std::vec::IntoIter<DriveItem>,
    path: String,
    depth: usize,
}

/// Depth-first search below `request.folder_id` for matching files.
///
/// Children are visited in listing order and a subfolder is descended into
/// at its position among its siblings, so results come out in traversal
/// order. Each folder is listed at most once even when it has several
/// parents. With `max_depth = Some(d)`, folders more than `d` levels below
/// the starting folder are not entered.
pub async fn find_files<A>(
    api: &A,
    request: &SearchRequest,
    max_depth: Option<usize>,
) -> Result<Vec<FoundFile>>
where
    A: DriveApi + ?Sized,
{
    request.validate()?;

    let mut visited: HashSet<String> = HashSet::from([request.folder_id.clone()]);
    let mut found = Vec::new();
    let mut listed = 1usize;
    let mut stack = vec![Level {
        children: api.list(&children_query(&request.folder_id)).await?.into_iter(),
        path: String::new(),
        depth: 0,
    }];

    while let Some(level) = stack.last_mut() {
        let Some(item) = level.children.next() else {
            stack.pop();
            continue;
        };
        let path = format!("{}/{}", level.path, item.name);

        if item.is_folder() {
            let depth = level.depth + 1;
            if max_depth.is_some_and(|max| depth > max) {
                tracing::trace!(%path, "depth limit reached");
                continue;
            }
            if !visited.insert(item.id.clone()) {
                tracing::debug!(%path, "folder already searched");
                continue;
            }
            let children = api.list(&children_query(&item.id)).await?;
            listed += 1;
            stack.push(Level {
                children: children.into_iter(),
                path,
                depth,
            });
        } else if request.matches(&item.name) {
            found.push(FoundFile {
                name: item.name,
                path,
                id: item.id,
                download_url: item.download_url,
            });
        }
    }

    tracing::info!(
        folder = %request.folder_id,
        keyword = %request.keyword,
        folders = listed,
        found = found.len(),
        "search finished"
    );
    Ok(found)
}
