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

use std::path::Path;

use nix::sys::stat::stat;

/// Identity of the filesystem backing `path` (`st_dev`). Two paths with the
/// same fsid live on the same device.
pub fn fs_id(path: impl AsRef<Path>) -> std::io::Result<u64> {
    let st = stat(path.as_ref())?;
    Ok(st.st_dev as u64)
}

/// Whether two paths are backed by the same filesystem.
pub fn same_fs(a: impl AsRef<Path>, b: impl AsRef<Path>) -> std::io::Result<bool> {
    Ok(fs_id(a)? == fs_id(b)?)
}
