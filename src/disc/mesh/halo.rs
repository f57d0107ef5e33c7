/// Exchange of per-element `f64` entries with neighboring partitions.
///
/// Buffers hold `nentries` values per element, local elements first and halo
/// elements after them. `exchange_start` posts the sends for local data and
/// `exchange_finish` fills the halo part; work that only touches local
/// elements may run between the two calls.
pub trait HaloExchange {
    fn nhalo(&self) -> usize;
    fn exchange_start(&self, buf: &mut [f64], nentries: usize);
    fn exchange_finish(&self, buf: &mut [f64], nentries: usize);
    fn exchange(&self, buf: &mut [f64], nentries: usize) {
        self.exchange_start(buf, nentries);
        self.exchange_finish(buf, nentries);
    }
}

/// Single-partition mesh: no halo elements, nothing to move.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialHalo;

impl HaloExchange for SerialHalo {
    fn nhalo(&self) -> usize {
        0
    }
    fn exchange_start(&self, buf: &mut [f64], nentries: usize) {
        debug_assert_eq!(buf.len() % nentries.max(1), 0);
    }
    fn exchange_finish(&self, _buf: &mut [f64], _nentries: usize) {}
}

/// Two ranks in one process, one per thread, joined by channels.
#[cfg(test)]
pub(crate) mod two_rank {
    use std::sync::mpsc::{Receiver, Sender, channel};

    use super::HaloExchange;
    use crate::disc::{basis::ElementType, mesh::Mesh};

    pub(crate) struct ChannelHalo {
        /// Local elements the peer holds as halo, in its halo order.
        send_elements: Vec<usize>,
        nhalo: usize,
        tx: Sender<Vec<f64>>,
        rx: Receiver<Vec<f64>>,
    }

    impl HaloExchange for ChannelHalo {
        fn nhalo(&self) -> usize {
            self.nhalo
        }
        fn exchange_start(&self, buf: &mut [f64], nentries: usize) {
            let mut out = Vec::with_capacity(self.send_elements.len() * nentries);
            for &e in &self.send_elements {
                out.extend_from_slice(&buf[e * nentries..(e + 1) * nentries]);
            }
            self.tx.send(out).unwrap();
        }
        fn exchange_finish(&self, buf: &mut [f64], nentries: usize) {
            let received = self.rx.recv().unwrap();
            let nlocal = buf.len() / nentries - self.nhalo;
            buf[nlocal * nentries..].copy_from_slice(&received);
        }
    }

    /// Channel ends for ranks 0 and 1.
    pub(crate) fn channels() -> [(Sender<Vec<f64>>, Receiver<Vec<f64>>); 2] {
        let (tx0, rx1) = channel();
        let (tx1, rx0) = channel();
        [(tx0, rx0), (tx1, rx1)]
    }

    /// Element and face of a rank's strip lying on the partition line `x = 1`.
    pub(crate) fn interface(mesh: &Mesh) -> (usize, usize) {
        (0..mesh.nelements)
            .flat_map(|e| (0..mesh.nfaces()).map(move |f| (e, f)))
            .find(|&(e, f)| {
                mesh.is_boundary_face(e, f) && (mesh.sgeo[[e, f]].center[0] - 1.0).abs() < 1e-12
            })
            .unwrap()
    }

    /// Rank `rank` of the unit-height strip `[0, 2]`, two triangle cells per
    /// rank, with the element across `x = 1` held as halo element `nelements`.
    pub(crate) fn triangle_strip(
        n: usize,
        rank: usize,
        (tx, rx): (Sender<Vec<f64>>, Receiver<Vec<f64>>),
    ) -> Mesh {
        let build = |r: usize| {
            let x0 = r as f64;
            Mesh::rectangle(ElementType::Triangle, n, (2, 1), (x0, x0 + 1.0), (0.0, 1.0)).unwrap()
        };
        let mut mesh = build(rank);
        let (own_e, own_f) = interface(&mesh);
        let (_, peer_f) = interface(&build(1 - rank));
        mesh.e_to_e[[own_e, own_f]] = mesh.nelements;
        mesh.e_to_f[[own_e, own_f]] = peer_f;
        mesh.halo = Box::new(ChannelHalo {
            send_elements: vec![own_e],
            nhalo: 1,
            tx,
            rx,
        });
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_exchange_keeps_local_data() {
        let halo = SerialHalo;
        let mut buf = vec![1.0, 2.0, 3.0, 4.0];
        halo.exchange(&mut buf, 2);
        assert_eq!(buf, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(halo.nhalo(), 0);
    }

    #[test]
    fn test_channel_exchange_fills_halo() {
        let [c0, c1] = two_rank::channels();
        let results = std::thread::scope(|scope| {
            let ranks = [(0, c0), (1, c1)].map(|(rank, ends)| {
                scope.spawn(move || {
                    let mesh = two_rank::triangle_strip(1, rank, ends);
                    let (own_e, _) = two_rank::interface(&mesh);
                    // two entries per element: rank and element id
                    let mut buf = vec![-1.0; 2 * mesh.ntotal()];
                    for e in 0..mesh.nelements {
                        buf[2 * e] = rank as f64;
                        buf[2 * e + 1] = e as f64;
                    }
                    mesh.halo.exchange_start(&mut buf, 2);
                    mesh.halo.exchange_finish(&mut buf, 2);
                    (mesh.ntotal(), own_e, buf)
                })
            });
            ranks.map(|handle| handle.join().unwrap())
        });
        for (rank, (ntotal, _, buf)) in results.iter().enumerate() {
            let (_, peer_e, _) = &results[1 - rank];
            assert_eq!(*ntotal, 5);
            assert_eq!(buf[8], (1 - rank) as f64);
            assert_eq!(buf[9], *peer_e as f64);
            assert_eq!(buf[0], rank as f64);
        }
    }
}
