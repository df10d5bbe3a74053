use crate::CoreError;
use hwaf_store::VcsKind;
use std::path::Path;
use std::process::Command;

/// Fetches a package's sources from version control into a fresh directory.
pub trait VcsClient {
    fn checkout(&self, vcs: VcsKind, remote: &str, dest: &Path) -> Result<(), CoreError>;
}

/// Shells out to the `git` and `svn` binaries found on `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemVcs;

impl SystemVcs {
    fn command(vcs: VcsKind, remote: &str, dest: &Path) -> Result<Command, CoreError> {
        let mut cmd = match vcs {
            VcsKind::Git => {
                let mut cmd = Command::new("git");
                cmd.args(["clone", "--quiet"]);
                cmd
            }
            VcsKind::Svn => {
                let mut cmd = Command::new("svn");
                cmd.args(["checkout", "--quiet"]);
                cmd
            }
            VcsKind::Local => return Err(CoreError::UnsupportedVcs(vcs)),
        };
        cmd.arg(remote).arg(dest);
        Ok(cmd)
    }
}

impl VcsClient for SystemVcs {
    fn checkout(&self, vcs: VcsKind, remote: &str, dest: &Path) -> Result<(), CoreError> {
        let mut cmd = Self::command(vcs, remote, dest)?;
        tracing::debug!("running {cmd:?}");
        let output = cmd.output().map_err(|e| CoreError::Vcs {
            vcs,
            remote: remote.to_owned(),
            reason: e.to_string(),
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::Vcs {
                vcs,
                remote: remote.to_owned(),
                reason: format!("{} ({})", stderr.trim(), output.status),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_has_no_command() {
        let err = SystemVcs::command(VcsKind::Local, "", Path::new("/tmp/x")).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedVcs(VcsKind::Local)));
    }

    #[test]
    fn git_command_line() {
        let cmd = SystemVcs::command(VcsKind::Git, "https://host/pkg.git", Path::new("src/pkg"))
            .unwrap();
        assert_eq!(cmd.get_program(), "git");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["clone", "--quiet", "https://host/pkg.git", "src/pkg"]);
    }

    #[test]
    fn svn_command_line() {
        let cmd = SystemVcs::command(VcsKind::Svn, "svn+ssh://host/pkg/trunk", Path::new("src/pkg"))
            .unwrap();
        assert_eq!(cmd.get_program(), "svn");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["checkout", "--quiet", "svn+ssh://host/pkg/trunk", "src/pkg"]);
    }
}
