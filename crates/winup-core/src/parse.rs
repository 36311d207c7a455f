//! Parsers for the text inventories printed by the servicing tools.
//!
//! Both tools print `Key : Value` lines grouped into blocks. Lines that do not
//! carry a colon are ignored, so banners and trailers fall away naturally.

use winup_schema::{DriverInventoryEntry, PackageInventoryEntry};

fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.trim()))
}

/// Parse `dism /Online /Get-Packages` output.
///
/// Blocks are separated by blank lines; a block without a package identity is
/// dropped.
pub fn parse_package_list(output: &str) -> Vec<PackageInventoryEntry> {
    let mut packages = Vec::new();
    let mut current = PackageInventoryEntry::new("", "");

    for line in output.lines().chain(std::iter::once("")) {
        if line.trim().is_empty() {
            if !current.identity.is_empty() {
                packages.push(std::mem::replace(
                    &mut current,
                    PackageInventoryEntry::new("", ""),
                ));
            }
            current.state.clear();
            continue;
        }

        let Some((key, value)) = split_key_value(line) else {
            continue;
        };
        if key.eq_ignore_ascii_case("Package Identity") {
            current.identity = value.to_string();
        } else if key.eq_ignore_ascii_case("State") {
            current.state = value.to_string();
        }
    }

    packages
}

/// Parse `pnputil /enum-drivers` output.
///
/// Every `Published Name` line starts a new block; blocks without an inf name
/// are dropped.
pub fn parse_driver_list(output: &str) -> Vec<DriverInventoryEntry> {
    let mut drivers = Vec::new();
    let mut current: Option<DriverInventoryEntry> = None;

    for line in output.lines() {
        let Some((key, value)) = split_key_value(line) else {
            continue;
        };
        let key = key.to_ascii_lowercase();

        if key == "published name" {
            if let Some(done) = current.take() {
                drivers.push(done);
            }
            current = Some(DriverInventoryEntry {
                inf_name: value.to_string(),
                ..Default::default()
            });
            continue;
        }

        // Fields before the first block header have nowhere to go.
        let Some(entry) = current.as_mut() else {
            continue;
        };
        match key.as_str() {
            "original name" => entry.original_name = value.to_string(),
            "provider name" => entry.provider = value.to_string(),
            "class name" => entry.class_name = value.to_string(),
            "driver version" => entry.version_and_date = value.to_string(),
            "signer name" => entry.signer = value.to_string(),
            _ => {}
        }
    }
    drivers.extend(current);

    drivers.retain(|d| !d.inf_name.is_empty());
    drivers
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISM_OUTPUT: &str = "\r
Deployment Image Servicing and Management tool\r
Version: 10.0.22621.2792\r
\r
Image Version: 10.0.22631.3007\r
\r
Packages listing:\r
\r
Package Identity : Package_for_KB5034441~31bf3856ad364e35~amd64~~22621.3007.1.1\r
State : Installed\r
Release Type : Update\r
Install Time : 1/10/2024 8:03 AM\r
\r
Package Identity : Package_for_ServicingStack_3000~31bf3856ad364e35~amd64~~22621.3000.1.2\r
State : Superseded\r
Release Type : Update\r
\r
The operation completed successfully.\r
";

    const PNPUTIL_OUTPUT: &str = "Microsoft PnP Utility

Published Name:     oem12.inf
Original Name:      iigd_dch.inf
Provider Name:      Intel Corporation
Class Name:         Display
Class GUID:         {4d36e968-e325-11ce-bfc1-08002be10318}
Driver Version:     06/21/2023 31.0.101.4502
Signer Name:        Microsoft Windows Hardware Compatibility Publisher

Published Name:     oem3.inf
Original Name:      rtkfilter.inf
Provider Name:      Realtek
Class Name:         Extension
Driver Version:     01/12/2022 6.0.9273.1
Signer Name:        Microsoft Windows Hardware Compatibility Publisher
";

    #[test]
    fn test_parse_package_list() {
        let packages = parse_package_list(DISM_OUTPUT);
        assert_eq!(packages.len(), 2);
        assert_eq!(
            packages[0].identity,
            "Package_for_KB5034441~31bf3856ad364e35~amd64~~22621.3007.1.1"
        );
        assert_eq!(packages[0].state, "Installed");
        assert_eq!(packages[1].state, "Superseded");
    }

    #[test]
    fn test_parse_package_list_skips_blocks_without_identity() {
        let packages = parse_package_list("State : Installed\n\nPackage Identity : \nState : Staged\n");
        assert!(packages.is_empty());
    }

    #[test]
    fn test_parse_driver_list() {
        let drivers = parse_driver_list(PNPUTIL_OUTPUT);
        assert_eq!(drivers.len(), 2);
        assert_eq!(drivers[0].inf_name, "oem12.inf");
        assert_eq!(drivers[0].original_name, "iigd_dch.inf");
        assert_eq!(drivers[0].provider, "Intel Corporation");
        assert_eq!(drivers[0].class_name, "Display");
        assert_eq!(drivers[0].version_and_date, "06/21/2023 31.0.101.4502");
        assert_eq!(drivers[1].inf_name, "oem3.inf");
        assert_eq!(drivers[1].provider, "Realtek");
    }

    #[test]
    fn test_parse_driver_list_drops_nameless_blocks() {
        let drivers = parse_driver_list("Provider Name: Orphan\nPublished Name:\nClass Name: X\n");
        assert!(drivers.is_empty());
    }
}
