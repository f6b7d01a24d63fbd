// Copyright 2025 OStore Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

pub type Result<T> = core::result::Result<T, FsError>;

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("mountpath {0} already exists")]
    AlreadyExists(String),

    #[error("mountpath {0} does not exist")]
    NotFound(String),

    #[error("mountpath {mpath} shares filesystem {fsid} with mountpath {used_by}")]
    DuplicateFsid { mpath: String, fsid: u64, used_by: String },

    #[error("mountpath {0} is not a directory")]
    NotDirectory(String),

    #[error("volume metadata belongs to target {found}, expected {expected}")]
    VmdMismatch { expected: String, found: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("volume metadata: {0}")]
    Serde(#[from] serde_json::Error),
}
