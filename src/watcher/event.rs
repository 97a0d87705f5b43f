use std::ffi::OsStr;
use std::path::Path;

use notify::event::{EventKind, ModifyKind, RenameMode};

/// A settled change to the watched file, emitted once per debounce window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent;

/// What the notify callback forwards to the debouncer.
#[derive(Debug)]
pub(crate) enum Signal {
    /// A qualifying raw event hit the target file.
    Modified,
    /// The OS notification backend reported an error.
    Failed(notify::Error),
}

/// Decide whether a raw directory event counts as a modification of `file_name`.
///
/// Qualifying kinds:
/// - data writes in place (`Modify(Data)`, or `Modify(Any)` on backends that
///   cannot tell what changed)
/// - creates, including a rename whose destination is the target, which is
///   how atomic saves land
///
/// Metadata changes, access, removal and renames away from the target are ignored.
pub(crate) fn is_modification(kind: &EventKind, paths: &[impl AsRef<Path>], file_name: &OsStr) -> bool {
    match kind {
        EventKind::Create(_)
        | EventKind::Modify(ModifyKind::Data(_))
        | EventKind::Modify(ModifyKind::Any)
        | EventKind::Modify(ModifyKind::Other) => names_target(paths, file_name),
        EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Any)) => {
            names_target(paths, file_name)
        }
        // [from, to]: only the destination matters.
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => paths
            .last()
            .is_some_and(|p| p.as_ref().file_name() == Some(file_name)),
        _ => false,
    }
}

fn names_target(paths: &[impl AsRef<Path>], file_name: &OsStr) -> bool {
    paths
        .iter()
        .any(|p| p.as_ref().file_name() == Some(file_name))
}
