use std::fmt;

use super::{interrupt, Kernel};
use crate::fs::FsError;
use crate::memory::MemToken;
use crate::process::{Pid, ProcessInfo};
use crate::sched::Algorithm;

/// The closed error side of every syscall. `Ok` is the sixth value of the
/// public result enum; it is spelled `Ok(..)` here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysError {
    AlreadyExists,
    NotFound,
    AtRoot,
    InvalidArgument,
    Error,
}

impl SysError {
    pub fn as_str(&self) -> &'static str {
        match self {
            SysError::AlreadyExists => "AlreadyExists",
            SysError::NotFound => "NotFound",
            SysError::AtRoot => "AtRoot",
            SysError::InvalidArgument => "InvalidArgument",
            SysError::Error => "Error",
        }
    }
}

impl fmt::Display for SysError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FsError> for SysError {
    fn from(e: FsError) -> Self {
        match e {
            FsError::NotFound => SysError::NotFound,
            FsError::AlreadyExists => SysError::AlreadyExists,
            FsError::AtRoot => SysError::AtRoot,
            FsError::InvalidArgument => SysError::InvalidArgument,
            FsError::OutOfMemory | FsError::Io => SysError::Error,
        }
    }
}

pub type SysResult<T = ()> = Result<T, SysError>;

/// Stable diagnostic rendering of a syscall outcome.
pub fn status_str<T>(result: &SysResult<T>) -> &'static str {
    match result {
        Ok(_) => "OK",
        Err(e) => e.as_str(),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SysInfo {
    pub total_memory: usize,
    pub used_memory: usize,
}

/// The single surface external components (shell, init, daemons) see.
///
/// The facade owns no state: every method translates arguments, delegates
/// to the kernel's subsystems under their locks, and maps internal error
/// variants onto the public result enum.
pub trait SysApi: Send + Sync {
    // ---- filesystem ----
    fn create_file(&self, path: &str) -> SysResult;
    fn touch_file(&self, path: &str) -> SysResult;
    fn delete_file(&self, path: &str) -> SysResult;
    fn write_file(&self, path: &str, content: &str) -> SysResult;
    fn read_file(&self, path: &str) -> SysResult<String>;
    fn edit_file(&self, path: &str, suffix: &str) -> SysResult;
    fn copy_file(&self, src: &str, dest: &str) -> SysResult;
    fn move_file(&self, src: &str, dest: &str) -> SysResult;
    fn make_dir(&self, path: &str) -> SysResult;
    fn remove_dir(&self, path: &str) -> SysResult;
    fn change_dir(&self, path: &str) -> SysResult;
    fn list_dir(&self, path: &str) -> SysResult<Vec<String>>;
    fn copy_dir(&self, src: &str, dest: &str) -> SysResult;
    fn move_dir(&self, src: &str, dest: &str) -> SysResult;
    fn get_working_dir(&self) -> String;
    fn file_exists(&self, path: &str) -> SysResult;
    fn save_to_disk(&self, name: &str) -> SysResult;
    fn load_from_disk(&self, name: &str) -> SysResult;
    fn list_data_files(&self) -> SysResult<Vec<String>>;
    fn reset_storage(&self) -> SysResult;

    // ---- processes ----
    fn fork(
        &self,
        name: &str,
        cycles: u32,
        memory: usize,
        priority: i32,
        persistent: bool,
    ) -> Option<Pid>;
    fn exit(&self, pid: Pid, code: i32) -> bool;
    fn reap(&self, pid: Pid) -> bool;
    fn wait_for_process(&self, pid: Pid) -> bool;
    fn send_signal(&self, pid: Pid, signal: i32) -> SysResult;
    fn process_exists(&self, pid: Pid) -> bool;
    fn process_list(&self) -> Vec<ProcessInfo>;
    fn add_cpu_work(&self, pid: Pid, cycles: u32) -> bool;

    // ---- memory ----
    fn allocate_memory(&self, size: usize, owner: Pid) -> Option<MemToken>;
    fn deallocate_memory(&self, token: MemToken) -> SysResult;

    // ---- system ----
    fn get_sys_info(&self) -> SysInfo;
    fn request_shutdown(&self);
    fn is_running(&self) -> bool;
    fn system_ticks(&self) -> u64;
    fn set_scheduling_algorithm(&self, name: &str, quantum: u32) -> bool;
    fn set_scheduler_cycles_per_interval(&self, cycles: u32) -> bool;
    fn set_scheduler_tick_interval_ms(&self, ms: u64) -> bool;
    fn log_level(&self) -> log::LevelFilter;
    fn set_log_level(&self, level: log::LevelFilter);
}

/// Kernel-backed implementation of the syscall surface.
pub struct KernelSysApi {
    kernel: Kernel,
}

impl KernelSysApi {
    pub fn new(kernel: Kernel) -> Self {
        KernelSysApi { kernel }
    }
}

impl SysApi for KernelSysApi {
    fn create_file(&self, path: &str) -> SysResult {
        self.kernel.with_fs(|fs, _| fs.create_file(path))?;
        Ok(())
    }

    fn touch_file(&self, path: &str) -> SysResult {
        self.kernel.with_fs(|fs, _| fs.touch_file(path))?;
        Ok(())
    }

    fn delete_file(&self, path: &str) -> SysResult {
        self.kernel.with_fs(|fs, pool| fs.delete_file(pool, path))?;
        Ok(())
    }

    fn write_file(&self, path: &str, content: &str) -> SysResult {
        self.kernel.with_fs(|fs, pool| fs.write_file(pool, path, content))?;
        Ok(())
    }

    fn read_file(&self, path: &str) -> SysResult<String> {
        Ok(self.kernel.with_fs(|fs, pool| fs.read_file(pool, path))?)
    }

    fn edit_file(&self, path: &str, suffix: &str) -> SysResult {
        self.kernel.with_fs(|fs, pool| fs.edit_file(pool, path, suffix))?;
        Ok(())
    }

    fn copy_file(&self, src: &str, dest: &str) -> SysResult {
        self.kernel.with_fs(|fs, pool| fs.copy_file(pool, src, dest))?;
        Ok(())
    }

    fn move_file(&self, src: &str, dest: &str) -> SysResult {
        self.kernel.with_fs(|fs, _| fs.move_file(src, dest))?;
        Ok(())
    }

    fn make_dir(&self, path: &str) -> SysResult {
        self.kernel.with_fs(|fs, _| fs.make_dir(path))?;
        Ok(())
    }

    fn remove_dir(&self, path: &str) -> SysResult {
        self.kernel.with_fs(|fs, pool| fs.remove_dir(pool, path))?;
        Ok(())
    }

    fn change_dir(&self, path: &str) -> SysResult {
        self.kernel.with_fs(|fs, _| fs.change_dir(path))?;
        Ok(())
    }

    fn list_dir(&self, path: &str) -> SysResult<Vec<String>> {
        Ok(self.kernel.with_fs(|fs, _| fs.list_dir(path))?)
    }

    fn copy_dir(&self, src: &str, dest: &str) -> SysResult {
        self.kernel.with_fs(|fs, pool| fs.copy_dir(pool, src, dest))?;
        Ok(())
    }

    fn move_dir(&self, src: &str, dest: &str) -> SysResult {
        self.kernel.with_fs(|fs, _| fs.move_dir(src, dest))?;
        Ok(())
    }

    fn get_working_dir(&self) -> String {
        self.kernel.with_fs(|fs, _| Ok::<_, FsError>(fs.working_dir())).unwrap_or_default()
    }

    fn file_exists(&self, path: &str) -> SysResult {
        self.kernel.with_fs(|fs, _| fs.file_exists(path))?;
        Ok(())
    }

    fn save_to_disk(&self, name: &str) -> SysResult {
        self.kernel.with_fs(|fs, pool| fs.save_to_disk(pool, name))?;
        Ok(())
    }

    fn load_from_disk(&self, name: &str) -> SysResult {
        self.kernel.with_fs(|fs, pool| fs.load_from_disk(pool, name))?;
        Ok(())
    }

    fn list_data_files(&self) -> SysResult<Vec<String>> {
        Ok(self.kernel.with_fs(|fs, _| fs.list_data_files())?)
    }

    fn reset_storage(&self) -> SysResult {
        self.kernel.with_fs(|fs, pool| {
            fs.reset(pool);
            Ok::<_, FsError>(())
        })?;
        Ok(())
    }

    fn fork(
        &self,
        name: &str,
        cycles: u32,
        memory: usize,
        priority: i32,
        persistent: bool,
    ) -> Option<Pid> {
        self.kernel.submit(name, cycles, memory, priority, persistent)
    }

    fn exit(&self, pid: Pid, code: i32) -> bool {
        self.kernel.exit(pid, code)
    }

    fn reap(&self, pid: Pid) -> bool {
        self.kernel.reap(pid)
    }

    /// Block until the scheduler reports completion or the process is
    /// killed; true only for a normal completion. A pending interrupt or a
    /// kernel shutdown unblocks the wait with `false`.
    fn wait_for_process(&self, pid: Pid) -> bool {
        let gate = match self.kernel.gate(pid) {
            Some(gate) => gate,
            None => return false,
        };
        let kernel = self.kernel.clone();
        gate.wait(move || interrupt::is_interrupted() || !kernel.is_running())
    }

    fn send_signal(&self, pid: Pid, signal: i32) -> SysResult {
        self.kernel.send_signal(pid, signal)
    }

    fn process_exists(&self, pid: Pid) -> bool {
        self.kernel.process_exists(pid)
    }

    fn process_list(&self) -> Vec<ProcessInfo> {
        self.kernel.process_list()
    }

    fn add_cpu_work(&self, pid: Pid, cycles: u32) -> bool {
        self.kernel.add_cpu_work(pid, cycles)
    }

    fn allocate_memory(&self, size: usize, owner: Pid) -> Option<MemToken> {
        self.kernel.allocate_memory(size, owner)
    }

    fn deallocate_memory(&self, token: MemToken) -> SysResult {
        if self.kernel.deallocate_memory(token) {
            Ok(())
        } else {
            Err(SysError::Error)
        }
    }

    fn get_sys_info(&self) -> SysInfo {
        self.kernel.sys_info()
    }

    fn request_shutdown(&self) {
        self.kernel.request_shutdown();
    }

    fn is_running(&self) -> bool {
        self.kernel.is_running()
    }

    fn system_ticks(&self) -> u64 {
        self.kernel.system_ticks()
    }

    fn set_scheduling_algorithm(&self, name: &str, quantum: u32) -> bool {
        match Algorithm::parse(name, quantum) {
            Some(algorithm) => {
                self.kernel.set_algorithm(algorithm);
                true
            }
            None => {
                log::error!("Unknown scheduling algorithm: {}", name);
                false
            }
        }
    }

    fn set_scheduler_cycles_per_interval(&self, cycles: u32) -> bool {
        if cycles == 0 {
            return false;
        }
        self.kernel.set_cycles_per_tick(cycles);
        true
    }

    fn set_scheduler_tick_interval_ms(&self, ms: u64) -> bool {
        if ms == 0 {
            return false;
        }
        self.kernel.set_tick_interval_ms(ms);
        true
    }

    fn log_level(&self) -> log::LevelFilter {
        crate::logger::level()
    }

    fn set_log_level(&self, level: log::LevelFilter) {
        crate::logger::set_level(level);
    }
}
