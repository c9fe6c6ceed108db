//! Wildcard DNS responder for the captive portal.
//!
//! While the access point is up, every DNS query is answered with the
//! portal's own address so that any hostname a client tries resolves to
//! the configuration page. The responder runs on a non-blocking UDP socket
//! polled from the main control loop; packet construction is pure and
//! host-testable.

use log::{debug, warn};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

/// Standard DNS port.
pub const DNS_PORT: u16 = 53;

/// TTL for the wildcard answer, in seconds. Kept short so clients re-ask
/// once the portal goes away.
const ANSWER_TTL: u32 = 60;

/// Largest DNS datagram we bother parsing.
const MAX_PACKET: usize = 512;

/// Build a response answering `query` with an A record pointing at
/// `answer`. Returns `None` when the packet is not a well-formed query.
///
/// Every query type gets the same A-record answer; captive clients probe
/// with A, AAAA and HTTPS queries alike and all of them must land on the
/// portal.
pub fn build_response(query: &[u8], answer: Ipv4Addr) -> Option<Vec<u8>> {
    if query.len() < 12 {
        return None;
    }
    // QR bit set means this is itself a response.
    if query[2] & 0x80 != 0 {
        return None;
    }
    let qdcount = u16::from_be_bytes([query[4], query[5]]);
    if qdcount == 0 {
        return None;
    }

    // Walk the first question's name labels.
    let mut pos = 12;
    loop {
        let len = *query.get(pos)? as usize;
        if len == 0 {
            pos += 1;
            break;
        }
        // Compression pointers never appear in the question of a query.
        if len & 0xC0 != 0 {
            return None;
        }
        pos += 1 + len;
        if pos >= query.len() {
            return None;
        }
    }
    // QTYPE and QCLASS.
    let question_end = pos + 4;
    if question_end > query.len() {
        return None;
    }

    let mut response = Vec::with_capacity(question_end + 16);
    // Transaction id copied from the query.
    response.extend_from_slice(&query[0..2]);
    // Flags: response, recursion available, no error.
    response.extend_from_slice(&[0x81, 0x80]);
    // QDCOUNT=1, ANCOUNT=1, NSCOUNT=0, ARCOUNT=0.
    response.extend_from_slice(&[0, 1, 0, 1, 0, 0, 0, 0]);
    // Echo the question.
    response.extend_from_slice(&query[12..question_end]);
    // Answer: pointer to the question name, type A, class IN.
    response.extend_from_slice(&[0xC0, 0x0C, 0, 1, 0, 1]);
    response.extend_from_slice(&ANSWER_TTL.to_be_bytes());
    response.extend_from_slice(&[0, 4]);
    response.extend_from_slice(&answer.octets());
    Some(response)
}

/// Non-blocking wildcard DNS server bound to port 53.
pub struct DnsRedirect {
    socket: UdpSocket,
    answer: Ipv4Addr,
}

impl DnsRedirect {
    /// Bind on all interfaces and answer with `answer`.
    pub fn bind(answer: Ipv4Addr) -> io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, DNS_PORT))?;
        socket.set_nonblocking(true)?;
        Ok(Self { socket, answer })
    }

    /// Drain and answer all pending queries. Never blocks.
    pub fn poll(&mut self) {
        let mut buf = [0u8; MAX_PACKET];
        loop {
            let (len, peer) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) => {
                    warn!("dns recv failed: {}", e);
                    return;
                }
            };
            if let Some(response) = build_response(&buf[..len], self.answer) {
                self.reply(&response, peer);
            } else {
                debug!("ignoring malformed dns packet from {}", peer);
            }
        }
    }

    fn reply(&self, response: &[u8], peer: SocketAddr) {
        if let Err(e) = self.socket.send_to(response, peer) {
            if e.kind() != io::ErrorKind::WouldBlock {
                warn!("dns send to {} failed: {}", peer, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A query for `name`, qtype as given, transaction id 0xBEEF.
    fn query_packet(name: &str, qtype: u16) -> Vec<u8> {
        let mut packet = vec![0xBE, 0xEF, 0x01, 0x00, 0, 1, 0, 0, 0, 0, 0, 0];
        for label in name.split('.') {
            packet.push(label.len() as u8);
            packet.extend_from_slice(label.as_bytes());
        }
        packet.push(0);
        packet.extend_from_slice(&qtype.to_be_bytes());
        packet.extend_from_slice(&[0, 1]);
        packet
    }

    #[test]
    fn test_answers_a_query_with_portal_ip() {
        let query = query_packet("example.com", 1);
        let response = build_response(&query, Ipv4Addr::new(192, 168, 4, 1)).unwrap();

        // Id echoed, QR set, one question and one answer.
        assert_eq!(&response[0..2], &[0xBE, 0xEF]);
        assert_eq!(response[2] & 0x80, 0x80);
        assert_eq!(&response[4..8], &[0, 1, 0, 1]);
        // Answer ends with RDLENGTH=4 and the portal address.
        assert_eq!(&response[response.len() - 6..], &[0, 4, 192, 168, 4, 1]);
    }

    #[test]
    fn test_question_echoed_verbatim() {
        let query = query_packet("portal.local", 1);
        let response = build_response(&query, Ipv4Addr::new(10, 0, 0, 1)).unwrap();
        let question = &query[12..];
        assert_eq!(&response[12..12 + question.len()], question);
    }

    #[test]
    fn test_non_a_queries_still_get_a_record() {
        // AAAA probe from a captive client.
        let query = query_packet("connectivitycheck.gstatic.com", 28);
        let response = build_response(&query, Ipv4Addr::new(192, 168, 4, 1)).unwrap();
        // Answer record type is A regardless of the question type.
        let answer = &response[response.len() - 14..];
        assert_eq!(&answer[2..6], &[0, 1, 0, 1]);
    }

    #[test]
    fn test_rejects_short_packet() {
        assert_eq!(build_response(&[0; 5], Ipv4Addr::LOCALHOST), None);
    }

    #[test]
    fn test_rejects_response_packet() {
        let mut packet = query_packet("example.com", 1);
        packet[2] |= 0x80;
        assert_eq!(build_response(&packet, Ipv4Addr::LOCALHOST), None);
    }

    #[test]
    fn test_rejects_zero_questions() {
        let mut packet = query_packet("example.com", 1);
        packet[5] = 0;
        assert_eq!(build_response(&packet, Ipv4Addr::LOCALHOST), None);
    }

    #[test]
    fn test_rejects_truncated_name() {
        let packet = query_packet("example.com", 1);
        assert_eq!(build_response(&packet[..14], Ipv4Addr::LOCALHOST), None);
    }
}
