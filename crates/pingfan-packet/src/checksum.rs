//! The internet checksum used by `ICMP` and `ICMPv6` echo packets.

/// Calculate the internet checksum over a packet held in one or more spans.
///
/// The ones-complement sum is formed over 16-bit big-endian words which may
/// span the boundary between adjacent buffers, so checksumming a packet held
/// contiguously and the same packet split at any byte boundary yields the same
/// value.
///
/// For `ICMP` the checksum covers the full packet.  For `ICMPv6` the checksum
/// additionally covers a pseudo-header and so the value calculated here is
/// indicative only; the kernel calculates and fills in the definitive value
/// for raw `ICMPv6` sockets.
#[must_use]
pub fn icmp_checksum(parts: &[&[u8]]) -> u16 {
    let mut sum = 0_u32;
    let mut high_octet = true;
    for part in parts {
        for &octet in *part {
            if high_octet {
                sum += u32::from(octet) << 8;
            } else {
                sum += u32::from(octet);
            }
            high_octet = !high_octet;
        }
    }
    sum = (sum & 0xffff) + (sum >> 16);
    sum = (sum & 0xffff) + (sum >> 16);
    !sum as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use rand::Rng;

    #[test]
    fn test_checksum_echo_request() {
        let buf = hex!("08 00 00 00 04 d2 00 0a");
        assert_eq!(0xf323, icmp_checksum(&[&buf]));
    }

    #[test]
    fn test_checksum_scattered_matches_contiguous() {
        let buf = hex!("08 00 00 00 04 d2 00 0a 61 62 63 64 65");
        let contiguous = icmp_checksum(&[&buf]);
        assert_eq!(contiguous, icmp_checksum(&[&buf[..1], &buf[1..]]));
        assert_eq!(contiguous, icmp_checksum(&[&buf[..3], &buf[3..7], &buf[7..]]));
        assert_eq!(
            contiguous,
            icmp_checksum(&[&buf[..8], &buf[8..8], &buf[8..]])
        );
    }

    #[test]
    fn test_checksum_odd_length() {
        assert_eq!(0xfeff, icmp_checksum(&[&[0x01]]));
        assert_eq!(0xfdfe, icmp_checksum(&[&[0x01, 0x01, 0x01]]));
    }

    #[test]
    fn test_checksum_empty() {
        assert_eq!(0xffff, icmp_checksum(&[]));
        assert_eq!(0xffff, icmp_checksum(&[&[]]));
    }

    #[test]
    fn test_checksum_over_checksummed_packet_is_zero() {
        let mut rng = rand::thread_rng();
        for len in [0, 2, 8, 56, 256] {
            let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            let checksum = icmp_checksum(&[&data]);
            assert_eq!(0, icmp_checksum(&[&data, &checksum.to_be_bytes()]));
        }
    }
}
