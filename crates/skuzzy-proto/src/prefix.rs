//! Message origin (`nick!user@host` or a server name).

/// Borrowed view of a message prefix.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PrefixRef<'a> {
    /// Nickname or server name.
    pub name: &'a str,
    /// Username, when the prefix carries one.
    pub user: Option<&'a str>,
    /// Hostname, when the prefix carries one.
    pub host: Option<&'a str>,
}

impl<'a> PrefixRef<'a> {
    /// Split a raw prefix (without the leading `:`). Never fails.
    pub fn parse(s: &'a str) -> Self {
        let (rest, host) = match s.split_once('@') {
            Some((rest, host)) => (rest, Some(host)),
            None => (s, None),
        };
        let (name, user) = match rest.split_once('!') {
            Some((name, user)) => (name, Some(user)),
            None => (rest, None),
        };
        Self { name, user, host }
    }

    /// A bare name containing a dot is taken to be a server.
    pub fn is_server(&self) -> bool {
        self.user.is_none() && self.host.is_none() && self.name.contains('.')
    }

    /// The nickname, unless this prefix names a server.
    pub fn nickname(&self) -> Option<&'a str> {
        if self.is_server() {
            None
        } else {
            Some(self.name)
        }
    }
}
