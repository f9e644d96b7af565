pub trait WriteBytesLe {
    fn write_le(&self, dst: &mut Vec<u8>);
}

macro_rules! impl_num_le {
    ($($t:ty),+) => { $(
        impl WriteBytesLe for $t { #[inline] fn write_le(&self, dst: &mut Vec<u8>) { dst.extend_from_slice(&self.to_le_bytes()); }}
    )+ }
}

impl_num_le!(u8, i8, u16, i16, u32, i32);

impl<T: WriteBytesLe> WriteBytesLe for Vec<T> {
    #[inline]
    fn write_le(&self, dst: &mut Vec<u8>) {
        self.iter().for_each(|item| item.write_le(dst));
    }
}

impl<T: WriteBytesLe, const N: usize> WriteBytesLe for [T; N] {
    #[inline]
    fn write_le(&self, dst: &mut Vec<u8>) {
        self.iter().for_each(|item| item.write_le(dst));
    }
}

#[macro_export]
macro_rules! impl_u8_enum {
    ($t:ty) => {
        impl WriteBytesLe for $t {
            fn write_le(&self, dst: &mut Vec<u8>) {
                dst.push(*self as u8)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::byteorder::WriteBytesLe;
    use gif89d_macros::ToBytes;

    #[derive(ToBytes)]
    struct Mini {
        a: u16,
        b: u32,
        tag: [u8; 4],
        tail: Vec<i8>,
    }

    #[test]
    fn to_bytes_le() {
        let s = Mini {
            a: 0x1234,
            b: 0xABCDEF01,
            tag: *b"TEST",
            tail: vec![-1, 2],
        };

        let mut vec_le = Vec::new();
        s.write_le(&mut vec_le);

        let expected_le = [
            0x34, 0x12, 0x01, 0xEF, 0xCD, 0xAB, b'T', b'E', b'S', b'T', 0xFF, 0x02,
        ];

        assert_eq!(&vec_le[..], &expected_le);
    }
}
