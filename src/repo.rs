// Git working-tree synchronization for the instructor test suite and the
// student submission.

use std::time::Duration;

use crate::{
    error::Error,
    settings::Settings,
    utils::{syscommand_timeout, SyscommandSettings},
};

fn gitcmd_settings(settings: &Settings, dir: &str) -> SyscommandSettings {
    SyscommandSettings {
        timeout: Duration::from_secs(settings.grading.sync_timeout),
        expected_code: Some(0),
        cwd: Some(dir.to_string()),
    }
}

/// Ensures that `dir` holds a checked-out working tree of `remote`.
///
/// On first use the directory is created and initialized with `remote` as its
/// origin; every call then pulls the configured branch and, when `revision`
/// is pinned, checks it out. Syncing an already-synced directory is
/// idempotent apart from the pull itself.
pub fn sync(
    settings: &Settings,
    remote: &str,
    dir: &str,
    revision: Option<&str>,
) -> Result<(), Error> {
    if !std::fs::exists(dir)? {
        log::info!("Initializing {dir} from {remote}");
        std::fs::create_dir_all(dir)?;
        syscommand_timeout(&["git", "init"], gitcmd_settings(settings, dir))?;
        syscommand_timeout(
            &["git", "remote", "add", "origin", remote],
            gitcmd_settings(settings, dir),
        )?;
    }

    log::info!("Pulling branch {} into {dir}", settings.grading.branch);
    syscommand_timeout(
        &["git", "pull", "origin", &settings.grading.branch],
        gitcmd_settings(settings, dir),
    )
    .inspect_err(|e| log::error!("Could not pull from {remote}: {e}"))?;

    if let Some(rev) = revision {
        log::info!("Checking out revision {rev} in {dir}");
        syscommand_timeout(&["git", "checkout", rev], gitcmd_settings(settings, dir))
            .inspect_err(|e| log::error!("Could not check out {rev} in {dir}: {e}"))?;
    }

    Ok(())
}

/// Stashes local modifications in `dir`, restoring a clean working tree.
pub fn stash(settings: &Settings, dir: &str) -> Result<(), Error> {
    log::debug!("Stashing local modifications in {dir}");
    syscommand_timeout(&["git", "stash"], gitcmd_settings(settings, dir))
        .inspect_err(|e| log::error!("Could not stash changes in {dir}: {e}"))?;
    Ok(())
}
