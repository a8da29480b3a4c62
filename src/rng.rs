#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn next_f32(&mut self) -> f32 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        (out as f64 / 4_294_967_296.0) as f32
    }

    pub fn bool(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        (self.next_f32() * len as f32).floor().min((len - 1) as f32) as usize
    }

    /// Fisher-Yates, walking from the back.
    pub fn shuffle<T>(&mut self, values: &mut [T]) {
        for idx in (1..values.len()).rev() {
            let swap_with = self.pick_index(idx + 1);
            values.swap(idx, swap_with);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Rng;

    #[test]
    fn same_seed_yields_same_sequence() {
        let mut a = Rng::new(30006);
        let mut b = Rng::new(30006);
        for _ in 0..64 {
            assert_eq!(a.next_f32().to_bits(), b.next_f32().to_bits());
        }
    }

    #[test]
    fn pick_index_stays_in_range() {
        let mut rng = Rng::new(7);
        for len in 1..20usize {
            for _ in 0..50 {
                assert!(rng.pick_index(len) < len);
            }
        }
        assert_eq!(rng.pick_index(0), 0);
    }

    #[test]
    fn shuffle_keeps_every_element() {
        let mut rng = Rng::new(99);
        let mut values: Vec<u8> = (0..8).collect();
        rng.shuffle(&mut values);
        let mut sorted = values.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..8).collect::<Vec<u8>>());
    }
}
