use std::io::Write;

/// Abstract the host environment to enable testing
pub trait Host: Send + Sync {
    // where to send normal output (e.g., stdout)
    fn output(&mut self) -> impl Write;

    // where to send error output (e.g., stderr)
    fn error(&mut self) -> impl Write;
}

/// Test host that captures output to in-memory buffers
#[cfg(test)]
#[derive(Debug, Default)]
pub struct TestHost {
    pub output_buf: Vec<u8>,
    pub error_buf: Vec<u8>,
}

#[cfg(test)]
impl TestHost {
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output_buf).into_owned()
    }

    pub fn error_text(&self) -> String {
        String::from_utf8_lossy(&self.error_buf).into_owned()
    }
}

#[cfg(test)]
impl Host for TestHost {
    fn output(&mut self) -> impl Write {
        &mut self.output_buf
    }

    fn error(&mut self) -> impl Write {
        &mut self.error_buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_host_keeps_every_line() {
        let mut host = TestHost::default();
        let _ = writeln!(host.output(), "first");
        let _ = writeln!(host.output(), "second");
        let _ = writeln!(host.error(), "oops");
        let _ = writeln!(host.error(), "again");

        assert_eq!(host.output_text(), "first\nsecond\n");
        assert_eq!(host.error_text(), "oops\nagain\n");
    }
}
