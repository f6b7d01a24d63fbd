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

//! The mountpath subsystem of a storage target: which local devices exist,
//! which of them are in service, which device a given object name lands on,
//! and the durable volume-metadata record of all of the above.

mod error;
mod hrw;
mod mountpath;
mod registry;
mod vmd;

pub use error::{FsError, Result};
pub use mountpath::{LomCache, LomEntry, Mountpath};
pub use registry::{FsRegistry, LoadedRegistry, MetadataHook, Mountpaths, NopHook};
pub use vmd::{Vmd, VmdMountpath, VmdOwner, VMD_CLEAN_FILE, VMD_FILE};
