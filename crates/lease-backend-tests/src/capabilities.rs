/// Optional backend behaviour exercised by the suite.
#[derive(Clone, Copy, Debug, Default)]
pub struct Capabilities {
    /// Backend issues renewable leases and implements renewal.
    pub renew: bool,
}

impl Capabilities {
    pub const fn with_renew(mut self) -> Self {
        self.renew = true;
        self
    }
}
