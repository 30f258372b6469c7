//! Associated data derived per render pass from the window and ambient
//! state.

use scrollback_core::{NetworkClass, PeerInfo, PeerKind};

/// Peer classification used for automatic-download policy decisions in the
/// rendered rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPeerClass {
    Contact,
    OtherPrivate,
    Group,
    Channel,
}

/// Contextual flags attached to every projection and re-derived on each
/// reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssocData {
    pub download_class: DownloadPeerClass,
    pub network: NetworkClass,
}

/// Derive associated data from the window's peer facts and the current
/// network class.
pub fn extract_associated_data(peer: &PeerInfo, network: NetworkClass) -> AssocData {
    let download_class = match peer.kind {
        PeerKind::User | PeerKind::Secret => {
            if peer.is_contact {
                DownloadPeerClass::Contact
            } else {
                DownloadPeerClass::OtherPrivate
            }
        }
        PeerKind::Group => DownloadPeerClass::Group,
        // Megagroup-style channels behave like groups for download policy.
        PeerKind::Channel { broadcast: false } => DownloadPeerClass::Group,
        PeerKind::Channel { broadcast: true } => DownloadPeerClass::Channel,
    };
    AssocData {
        download_class,
        network,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(kind: PeerKind, is_contact: bool) -> PeerInfo {
        PeerInfo { kind, is_contact }
    }

    #[test]
    fn test_private_peers_split_on_contact_flag() {
        let contact = extract_associated_data(&peer(PeerKind::User, true), NetworkClass::Wifi);
        assert_eq!(contact.download_class, DownloadPeerClass::Contact);

        let stranger = extract_associated_data(&peer(PeerKind::Secret, false), NetworkClass::Wifi);
        assert_eq!(stranger.download_class, DownloadPeerClass::OtherPrivate);
    }

    #[test]
    fn test_group_like_channels_classify_as_groups() {
        let megagroup = extract_associated_data(
            &peer(PeerKind::Channel { broadcast: false }, false),
            NetworkClass::Cellular,
        );
        assert_eq!(megagroup.download_class, DownloadPeerClass::Group);

        let broadcast = extract_associated_data(
            &peer(PeerKind::Channel { broadcast: true }, false),
            NetworkClass::Cellular,
        );
        assert_eq!(broadcast.download_class, DownloadPeerClass::Channel);
        assert_eq!(broadcast.network, NetworkClass::Cellular);
    }
}
