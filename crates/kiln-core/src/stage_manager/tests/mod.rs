#[cfg(test)]
mod pipeline_tests;

#[cfg(test)]
pub(crate) mod support {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use serde_json::Value;

    use crate::host::{CodeHost, HostError};

    /// Host that records inclusions and can be told to fail one path
    #[derive(Debug, Default)]
    pub struct TracingHost {
        pub included: Mutex<Vec<PathBuf>>,
        pub fail_on: Option<PathBuf>,
    }

    impl TracingHost {
        pub fn included(&self) -> Vec<PathBuf> {
            self.included.lock().unwrap().clone()
        }
    }

    impl CodeHost for TracingHost {
        fn read_metadata(&self, path: &Path) -> Result<Value, HostError> {
            Err(HostError::NotFound { path: path.to_path_buf() })
        }

        fn include(&self, path: &Path) -> Result<(), HostError> {
            if self.fail_on.as_deref() == Some(path) {
                return Err(HostError::NotFound { path: path.to_path_buf() });
            }
            self.included.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }
}
