//! 15-bit Art-Net port addresses: net (7 bits), sub-net (4), universe (4).

pub const NET_MAX: u16 = 127;
pub const SUBNET_MAX: u16 = 15;
pub const UNIVERSE_MAX: u16 = 15;

/// Net + sub-net part of an address.
pub const NET_SUBNET_MASK: u16 = 0xfff0;
pub const UNIVERSE_MASK: u16 = 0x000f;

/// Pack an address from its parts; out-of-range parts are masked.
///
/// # Examples
/// ```
/// use artnode_core::address::{address_net, address_subnet, address_universe, artnet_address};
///
/// let address = artnet_address(1, 2, 3);
/// assert_eq!(address, 0x0123);
/// assert_eq!(address_net(address), 1);
/// assert_eq!(address_subnet(address), 2);
/// assert_eq!(address_universe(address), 3);
/// ```
pub fn artnet_address(net: u16, subnet: u16, universe: u16) -> u16 {
    ((net & NET_MAX) << 8) | ((subnet & SUBNET_MAX) << 4) | (universe & UNIVERSE_MAX)
}

pub fn address_net(address: u16) -> u16 {
    (address >> 8) & NET_MAX
}

pub fn address_subnet(address: u16) -> u16 {
    (address >> 4) & SUBNET_MAX
}

pub fn address_universe(address: u16) -> u16 {
    address & UNIVERSE_MAX
}

pub fn same_net_subnet(a: u16, b: u16) -> bool {
    a & NET_SUBNET_MASK == b & NET_SUBNET_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_are_masked() {
        assert_eq!(artnet_address(128, 16, 16), 0x0000);
        assert_eq!(artnet_address(127, 15, 15), 0x7fff);
    }

    #[test]
    fn same_net_subnet_ignores_universe() {
        assert!(same_net_subnet(0x0120, 0x012f));
        assert!(!same_net_subnet(0x0120, 0x0130));
    }
}
