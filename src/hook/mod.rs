//! Hook installation and repository scaffolding.

pub mod install;
pub mod scaffold;

pub use install::{
    HOOK_MARKER, HOOK_NAME, HOOK_SCRIPT, HookPaths, InstallAction, UninstallAction, install,
    is_our_hook, uninstall,
};
pub use scaffold::{EXAMPLE_ENV, EXAMPLE_IGNORE, init};
