use azure_core::error::{Error, ErrorKind};
use std::fmt;

const SCHEME_SEPARATOR: &str = "://";
const BLOB_HOST_SUFFIX: &str = "blob.core.windows.net";

/// Where a blob lives: `https://{account}.blob.core.windows.net/{container}/{blob}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocator {
    pub account: String,
    pub container: String,
    pub blob: String,
}

impl BlobLocator {
    pub fn new(
        account: impl Into<String>,
        container: impl Into<String>,
        blob: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            container: container.into(),
            blob: blob.into(),
        }
    }

    /// Splits a public-cloud blob URI into its parts.
    ///
    /// This is a substring scan, not URL validation: only the scheme
    /// separator, the `blob.core.windows.net` host suffix and the two path
    /// slashes are looked for. The blob name is everything after the
    /// container, so virtual directories (`a/b/c.vhd`) are kept intact.
    pub fn parse(uri: &str) -> azure_core::Result<Self> {
        let invalid = |reason: &str| {
            let message = format!("invalid blob uri '{uri}': {reason}");
            Error::message(ErrorKind::DataConversion, message)
        };

        let authority_start = uri
            .find(SCHEME_SEPARATOR)
            .map(|index| index + SCHEME_SEPARATOR.len())
            .ok_or_else(|| invalid("missing scheme"))?;
        let host_suffix = uri
            .find(BLOB_HOST_SUFFIX)
            .ok_or_else(|| invalid("host is not *.blob.core.windows.net"))?;
        if host_suffix <= authority_start {
            return Err(invalid("missing storage account name"));
        }
        // the account name ends at the '.' in front of the host suffix
        let account = uri[authority_start..host_suffix]
            .strip_suffix('.')
            .filter(|account| !account.is_empty())
            .ok_or_else(|| invalid("missing storage account name"))?;

        let container_start = uri[authority_start..]
            .find('/')
            .map(|index| authority_start + index + 1)
            .ok_or_else(|| invalid("missing container"))?;
        let container_end = uri[container_start..]
            .find('/')
            .map(|index| container_start + index)
            .ok_or_else(|| invalid("missing blob name"))?;

        Ok(Self::new(
            account,
            &uri[container_start..container_end],
            &uri[container_end + 1..],
        ))
    }
}

impl fmt::Display for BlobLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "https://{}.{}/{}/{}",
            self.account, BLOB_HOST_SUFFIX, self.container, self.blob
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_account_container_and_blob() {
        let locator = BlobLocator::parse("https://acct.blob.core.windows.net/vhds/disk.vhd").unwrap();
        assert_eq!(locator, BlobLocator::new("acct", "vhds", "disk.vhd"));
    }

    #[test]
    fn keeps_virtual_directories_in_blob_name() {
        let locator = BlobLocator::parse(
            "https://ib52izs3mc4ki.blob.core.windows.net/system/Microsoft.Compute/Images/copiedvhds/vm-osdisk-osDisk.vhd",
        )
        .unwrap();
        assert_eq!(locator.account, "ib52izs3mc4ki");
        assert_eq!(locator.container, "system");
        assert_eq!(
            locator.blob,
            "Microsoft.Compute/Images/copiedvhds/vm-osdisk-osDisk.vhd"
        );
    }

    #[test]
    fn accepts_plain_http() {
        let locator =
            BlobLocator::parse("http://storageaccountname.blob.core.windows.net/containername/blob.vhd")
                .unwrap();
        assert_eq!(
            locator,
            BlobLocator::new("storageaccountname", "containername", "blob.vhd")
        );
    }

    #[test]
    fn non_ascii_account_names_are_kept() {
        let locator = BlobLocator::parse("https://accé.blob.core.windows.net/vhds/disk.vhd").unwrap();
        assert_eq!(locator.account, "accé");
    }

    #[test]
    fn display_round_trips_the_public_uri() {
        let uri = "https://acct.blob.core.windows.net/vhds/disk.vhd";
        assert_eq!(BlobLocator::parse(uri).unwrap().to_string(), uri);
    }

    #[test]
    fn rejects_uris_without_the_expected_pieces() {
        for uri in [
            "acct.blob.core.windows.net/vhds/disk.vhd",
            "https://acct.file.core.windows.net/share/disk.vhd",
            "https://blob.core.windows.net/vhds/disk.vhd",
            "https://acct.blob.core.windows.net",
            "https://acct.blob.core.windows.net/vhds",
            "https://.blob.core.windows.net/vhds/disk.vhd",
            "https://accéblob.core.windows.net/vhds/disk.vhd",
            "https://éblob.core.windows.net/vhds/disk.vhd",
        ] {
            let error = BlobLocator::parse(uri).unwrap_err();
            assert_eq!(error.kind(), &ErrorKind::DataConversion, "{uri}");
        }
    }
}
