//! Folder-level duplicate roll-up: collapses duplicate-file groups that together form
//! duplicate subtrees into `FolderGroup`s, and rewrites `file_groups` to drop any file
//! path that falls under a reported folder group.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use blake3::Hasher;

use crate::report::{FileGroup, FolderGroup};

/// A node in the directory tree built from the walk, keyed by path relative to the root.
struct DirNode {
    child_dirs: Vec<PathBuf>,
    child_files: Vec<(PathBuf, u64)>,
}

/// Inputs needed to compute directory digests: every directory visited (including empty
/// ones, so an empty subdirectory still contributes a child entry to its parent's digest)
/// and every file with the per-file digest string to use as its content key.
pub struct DirectoryTree {
    dirs: Vec<PathBuf>,
    file_digest: HashMap<PathBuf, String>,
    file_size: HashMap<PathBuf, u64>,
}

impl DirectoryTree {
    pub fn new() -> Self {
        Self { dirs: vec![PathBuf::new()], file_digest: HashMap::new(), file_size: HashMap::new() }
    }

    pub fn add_dir(&mut self, rel_path: PathBuf) {
        self.dirs.push(rel_path);
    }

    pub fn add_file(&mut self, rel_path: PathBuf, size: u64, digest_key: String) {
        self.file_size.insert(rel_path.clone(), size);
        self.file_digest.insert(rel_path, digest_key);
    }

    fn build_nodes(&self) -> HashMap<PathBuf, DirNode> {
        let mut nodes: HashMap<PathBuf, DirNode> = HashMap::new();
        for dir in &self.dirs {
            nodes.entry(dir.clone()).or_insert_with(|| DirNode { child_dirs: Vec::new(), child_files: Vec::new() });
        }
        for dir in &self.dirs {
            if let Some(parent) = parent_of(dir) {
                nodes.entry(parent).or_insert_with(|| DirNode { child_dirs: Vec::new(), child_files: Vec::new() }).child_dirs.push(dir.clone());
            }
        }
        for (file, size) in &self.file_size {
            let parent = parent_of(file).unwrap_or_default();
            nodes.entry(parent).or_insert_with(|| DirNode { child_dirs: Vec::new(), child_files: Vec::new() }).child_files.push((file.clone(), *size));
        }
        nodes
    }
}

impl Default for DirectoryTree {
    fn default() -> Self {
        Self::new()
    }
}

fn parent_of(rel_path: &Path) -> Option<PathBuf> {
    if rel_path.as_os_str().is_empty() {
        return None;
    }
    Some(rel_path.parent().map(|p| p.to_path_buf()).unwrap_or_default())
}

struct ComputedDir {
    digest: String,
    file_count: u64,
    total_bytes: u64,
}

/// Compute a deterministic digest over a directory's sorted `(name, kind, digest)` children.
fn hash_children(entries: &[(String, bool, String)]) -> String {
    let mut hasher = Hasher::new();
    for (name, is_dir, digest) in entries {
        hasher.update(if *is_dir { b"D" } else { b"F" });
        hasher.update(name.as_bytes());
        hasher.update(b"\0");
        hasher.update(digest.as_bytes());
        hasher.update(b"\0");
    }
    hex::encode(hasher.finalize().as_bytes())
}

mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        let mut s = String::with_capacity(bytes.len() * 2);
        for b in bytes {
            s.push_str(&format!("{b:02x}"));
        }
        s
    }
}

/// Compute every directory's digest bottom-up, returning `(relative_path, ComputedDir)` for
/// every directory reachable from the walked root, including the root itself.
fn compute_all(tree: &DirectoryTree) -> HashMap<PathBuf, ComputedDir> {
    let nodes = tree.build_nodes();
    let mut dirs: Vec<&PathBuf> = nodes.keys().collect();
    dirs.sort_by_key(|p| std::cmp::Reverse(p.components().count()));

    let mut computed: HashMap<PathBuf, ComputedDir> = HashMap::new();
    for dir in dirs {
        let node = &nodes[dir];
        let mut entries: Vec<(String, bool, String)> = Vec::new();
        let mut file_count = 0u64;
        let mut total_bytes = 0u64;

        for file in &node.child_files {
            let (path, size) = file;
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
            let digest = tree.file_digest.get(path).cloned().unwrap_or_else(|| format!("unique:{}", path.display()));
            entries.push((name, false, digest));
            file_count += 1;
            total_bytes += size;
        }
        for child_dir in &node.child_dirs {
            let name = child_dir.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
            if let Some(c) = computed.get(child_dir) {
                entries.push((name, true, c.digest.clone()));
                file_count += c.file_count;
                total_bytes += c.total_bytes;
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let digest = hash_children(&entries);
        computed.insert(dir.clone(), ComputedDir { digest, file_count, total_bytes });
    }
    computed
}

/// Roll up duplicate file groups into folder groups, and filter `file_groups` to drop any
/// member beneath a reported folder group.
pub fn roll_up(tree: &DirectoryTree, mut file_groups: Vec<FileGroup>) -> (Vec<FolderGroup>, Vec<FileGroup>) {
    let computed = compute_all(tree);

    let mut by_digest: HashMap<String, Vec<PathBuf>> = HashMap::new();
    for (path, info) in &computed {
        if path.as_os_str().is_empty() {
            continue; // the root itself is never a candidate
        }
        if info.file_count == 0 {
            continue; // empty subtree, never a duplicate candidate
        }
        by_digest.entry(info.digest.clone()).or_default().push(path.clone());
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    for members in by_digest.values() {
        if members.len() >= 2 {
            candidates.extend(members.iter().cloned());
        }
    }
    let candidate_set: std::collections::HashSet<PathBuf> = candidates.iter().cloned().collect();

    // Containment rule: suppress any candidate that has a proper ancestor which is itself
    // a candidate (reporting the ancestor already implies the descendant).
    let maximal: Vec<PathBuf> = candidates
        .iter()
        .filter(|p| !has_candidate_ancestor(p, &candidate_set))
        .cloned()
        .collect();
    let maximal_set: std::collections::HashSet<PathBuf> = maximal.into_iter().collect();

    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for path in &maximal_set {
        let digest = computed[path].digest.clone();
        groups.entry(digest).or_default().push(path.clone());
    }

    let mut folder_groups: Vec<FolderGroup> = groups
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(digest, members)| {
            let info = &computed[&members[0]];
            FolderGroup { digest, file_count: info.file_count, total_bytes: info.total_bytes, members }
        })
        .collect();
    folder_groups.sort_by(|a, b| a.digest.cmp(&b.digest));

    let suppressed_prefixes: Vec<&PathBuf> = folder_groups.iter().flat_map(|g| g.members.iter()).collect();

    for group in &mut file_groups {
        group.members.retain(|path| !suppressed_prefixes.iter().any(|prefix| path.starts_with(prefix)));
    }
    file_groups.retain(|g| g.members.len() >= 2);

    (folder_groups, file_groups)
}

fn has_candidate_ancestor(path: &Path, candidates: &std::collections::HashSet<PathBuf>) -> bool {
    path.ancestors()
        .skip(1)
        .any(|ancestor| !ancestor.as_os_str().is_empty() && candidates.contains(ancestor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_subtrees_become_a_folder_group() {
        let mut tree = DirectoryTree::new();
        tree.add_dir(PathBuf::from("a"));
        tree.add_dir(PathBuf::from("b"));
        tree.add_file(PathBuf::from("a/1.txt"), 5, "digestX".to_string());
        tree.add_file(PathBuf::from("b/1.txt"), 5, "digestX".to_string());

        let (folder_groups, file_groups) = roll_up(&tree, vec![]);
        assert_eq!(folder_groups.len(), 1);
        assert_eq!(folder_groups[0].members.len(), 2);
        assert!(file_groups.is_empty());
    }

    #[test]
    fn ancestor_suppresses_descendant_match() {
        let mut tree = DirectoryTree::new();
        tree.add_dir(PathBuf::from("a"));
        tree.add_dir(PathBuf::from("a/sub"));
        tree.add_dir(PathBuf::from("b"));
        tree.add_dir(PathBuf::from("b/sub"));
        tree.add_file(PathBuf::from("a/sub/1.txt"), 5, "digestX".to_string());
        tree.add_file(PathBuf::from("b/sub/1.txt"), 5, "digestX".to_string());

        let (folder_groups, _) = roll_up(&tree, vec![]);
        // Both a/ and a/sub match b/ and b/sub respectively; only the ancestor (a, b) survives.
        assert_eq!(folder_groups.len(), 1);
        let mut members = folder_groups[0].members.clone();
        members.sort();
        assert_eq!(members, vec![PathBuf::from("a"), PathBuf::from("b")]);
    }

    #[test]
    fn distinct_content_does_not_match() {
        let mut tree = DirectoryTree::new();
        tree.add_dir(PathBuf::from("a"));
        tree.add_dir(PathBuf::from("b"));
        tree.add_file(PathBuf::from("a/1.txt"), 5, "digestX".to_string());
        tree.add_file(PathBuf::from("b/1.txt"), 5, "digestY".to_string());

        let (folder_groups, _) = roll_up(&tree, vec![]);
        assert!(folder_groups.is_empty());
    }
}
