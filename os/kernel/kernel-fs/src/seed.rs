//! The fixed tree every boot starts from.

use crate::{Filesystem, FsError};
use kernel_alloc::Heap;

pub(crate) const DIRECTORIES: &[&str] = &[
    "/home", "/bin", "/etc", "/tmp", "/dev", "/var", "/var/log", "/usr", "/usr/bin",
];

pub(crate) struct SeedFile {
    pub path: &'static str,
    pub contents: &'static str,
    pub executable: bool,
}

pub(crate) const FILES: &[SeedFile] = &[
    SeedFile {
        path: "/home/readme.txt",
        contents: "Welcome!\n\n\
            This system runs entirely from memory:\n\
            - a first-fit heap allocator\n\
            - an inode filesystem with one 512-byte block per file\n\
            - a cooperative round-robin process table\n\n\
            Try: ls, cd, cat, edit, mkdir, touch, cp, mv, rm,\n\
            find, grep, tree, ps, meminfo, df, help\n",
        executable: false,
    },
    SeedFile {
        path: "/home/sample.c",
        contents: "#include <stdio.h>\n\n\
            int main(void) {\n    \
                printf(\"hello from the sample program\\n\");\n    \
                return 0;\n\
            }\n",
        executable: false,
    },
    SeedFile {
        path: "/etc/config.cfg",
        contents: "# kernel configuration\n\n\
            [system]\n\
            scheduler=round_robin\n\
            time_slice=10\n\n\
            [filesystem]\n\
            block_size=512\n\
            max_files=256\n\
            max_blocks=1024\n\n\
            [display]\n\
            mode=vga_text\n\
            width=80\n\
            height=25\n\n\
            [debug]\n\
            level=info\n\
            log_file=/var/log/kernel.log\n",
        executable: false,
    },
    SeedFile {
        path: "/bin/hello.sh",
        contents: "#!/bin/sh\n\
            echo \"hello\"\n\
            echo \"current directory: $(pwd)\"\n\
            ls /bin\n\
            df\n",
        executable: true,
    },
    SeedFile {
        path: "/dev/version",
        contents: concat!(
            "kernel ",
            env!("CARGO_PKG_VERSION"),
            "\nfilesystem: in-memory, single block per file\n"
        ),
        executable: false,
    },
    SeedFile {
        path: "/tmp/notes.txt",
        contents: "notes\n=====\n\n\
            - [x] heap allocator\n\
            - [x] filesystem\n\
            - [x] process table\n\
            - [ ] persistent storage\n\
            - [ ] preemptive scheduling\n",
        executable: false,
    },
];

/// Create the standard directories and starter files.
pub(crate) fn populate(fs: &mut Filesystem, heap: &mut Heap) -> Result<(), FsError> {
    for dir in DIRECTORIES {
        fs.create_directory(dir)?;
    }
    for file in FILES {
        fs.write_all(heap, file.path, file.contents.as_bytes())?;
        if file.executable {
            let permissions = fs.stat(file.path)?.permissions.with_execute(true);
            fs.set_permissions(file.path, permissions)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_info::storage::FS_BLOCK_SIZE;

    #[test]
    fn starter_files_fit_in_one_block() {
        for file in FILES {
            assert!(file.contents.len() <= FS_BLOCK_SIZE, "{}", file.path);
        }
    }
}
