// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    once_cell::sync::Lazy,
    std::{
        io::{BufRead, BufReader, Write},
        net::TcpListener,
        thread::JoinHandle,
    },
};

#[cfg(unix)]
use {
    crate::{config::VsWhereConfig, error::Result, query::VsWhere},
    std::{os::unix::fs::PermissionsExt, path::PathBuf},
};

pub static DEFAULT_TEMP_DIR: Lazy<tempfile::TempDir> = Lazy::new(|| {
    tempfile::Builder::new()
        .prefix("vswhere-test")
        .tempdir()
        .expect("unable to create temporary directory")
});

/// Serve `body` over HTTP on a loopback port for `requests` connections.
///
/// Returns the URL of the served file and a handle resolving to the request
/// lines that were received.
pub fn serve_http(
    body: &'static [u8],
    requests: usize,
) -> std::io::Result<(String, JoinHandle<std::io::Result<Vec<String>>>)> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let url = format!("http://{}/vswhere.exe", listener.local_addr()?);

    let handle = std::thread::spawn(move || {
        let mut seen = vec![];

        for _ in 0..requests {
            let (mut stream, _) = listener.accept()?;
            let mut reader = BufReader::new(stream.try_clone()?);

            let mut request_line = String::new();
            reader.read_line(&mut request_line)?;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line)? == 0 || line == "\r\n" {
                    break;
                }
            }
            seen.push(request_line.trim_end().to_string());

            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )?;
            stream.write_all(body)?;
            stream.flush()?;
        }

        Ok(seen)
    });

    Ok((url, handle))
}

/// Create a shell script standing in for vswhere.exe.
///
/// The script records its arguments to the returned log path, prints `stdout`
/// and exits with `exit_code`. Non-zero exits also write to stderr.
#[cfg(unix)]
pub fn fake_vswhere(name: &str, stdout: &str, exit_code: i32) -> Result<(VsWhere, PathBuf)> {
    let dir = DEFAULT_TEMP_DIR.path().join(name);
    std::fs::create_dir_all(&dir)?;

    let stdout_path = dir.join("stdout");
    let log_path = dir.join("args.log");
    let script_path = dir.join("vswhere.exe");

    std::fs::write(&stdout_path, stdout)?;
    std::fs::write(
        &script_path,
        format!(
            "#!/bin/sh\n\
             echo \"$@\" > '{log}'\n\
             cat '{stdout}'\n\
             if [ {code} -ne 0 ]; then echo 'fake vswhere failure' >&2; fi\n\
             exit {code}\n",
            log = log_path.display(),
            stdout = stdout_path.display(),
            code = exit_code,
        ),
    )?;
    std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755))?;

    let config = VsWhereConfig::default()
        .vswhere_path(&script_path)
        .cache_dir(dir.join("cache"))
        .allow_download(false);

    Ok((VsWhere::new(config), log_path))
}
