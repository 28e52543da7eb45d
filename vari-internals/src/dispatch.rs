//! Runtime index to const-generic index.
//!
//! [`dispatch_index`] calls [`IndexFn::call::<J>`](IndexFn::call) with `J`
//! equal to a runtime index. The lookup goes through a chain of fixed-width
//! match blocks of [`BLOCK`] cases each. Every block is a plain jump table,
//! and an index outside a block falls through to the next one, so the amount
//! of code per block stays bounded no matter how large `N` gets.
//!
//! [`dispatch`] builds the two-stage form on top: a [`Factory`] produces a
//! value for the selected `J`, and a [`Route`] consumes it.

/// Number of cases per match block.
pub const BLOCK: usize = 32;

/// Largest supported `N`.
pub const MAX: usize = 8 * BLOCK;

/// A function with a const-generic index.
pub trait IndexFn {
    /// The value produced by [`IndexFn::call`].
    type Output;

    /// Calls the function for index `J`.
    fn call<const J: usize>(self) -> Self::Output;
}

/// Produces a value whose type depends on a const-generic index.
pub trait Factory {
    /// The value produced for index `J`.
    type Out<const J: usize>;

    /// Produces the value for index `J`.
    fn make<const J: usize>(&mut self) -> Self::Out<J>;
}

/// Consumes the values produced by a [`Factory`].
pub trait Route<F: Factory> {
    /// The value returned by [`Route::route`].
    type Output;

    /// Consumes the value produced for index `J`.
    fn route<const J: usize>(self, value: F::Out<J>) -> Self::Output;
}

/// Calls `f.call::<J>()` with `J == index`.
///
/// # Panics
///
/// Panics if `index >= N`. Fails to compile if `N > MAX`.
#[inline]
pub fn dispatch_index<const N: usize, F: IndexFn>(index: usize, f: F) -> F::Output {
    const { assert!(N <= MAX, "index dispatch supports at most 256 cases") };
    block_0::<N, F>(index, f)
}

/// Two-stage dispatch: selects `J == index`, then calls
/// `route.route::<J>(factory.make::<J>())`.
///
/// # Panics
///
/// Panics if `index >= N`. Fails to compile if `N > MAX`.
#[inline]
pub fn dispatch<const N: usize, F, R>(index: usize, factory: F, route: R) -> R::Output
where
    F: Factory,
    R: Route<F>,
{
    dispatch_index::<N, _>(index, Staged { factory, route })
}

/// Adapter running a [`Factory`] followed by a [`Route`] as an [`IndexFn`].
struct Staged<F, R> {
    /// Produces the value for the selected index.
    factory: F,
    /// Consumes the produced value.
    route: R,
}

impl<F: Factory, R: Route<F>> IndexFn for Staged<F, R> {
    type Output = R::Output;

    #[inline]
    fn call<const J: usize>(mut self) -> R::Output {
        let value = self.factory.make::<J>();
        self.route.route::<J>(value)
    }
}

/// Reached when the index is past every case.
#[cold]
#[inline(never)]
#[track_caller]
fn out_of_range(index: usize, len: usize) -> ! {
    panic!("dispatch index {index} is out of range for {len} cases")
}

/// Generates one match block of the chain.
macro_rules! block {
    ($name:ident => $next:ident; $($j:literal)*) => {
        /// One block of the dispatch chain.
        #[inline]
        fn $name<const N: usize, F: IndexFn>(index: usize, f: F) -> F::Output {
            match index {
                $($j if $j < N => f.call::<$j>(),)*
                _ => $next::<N, F>(index, f),
            }
        }
    };
}

block!(block_0 => block_1;
    0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31
);
block!(block_1 => block_2;
    32 33 34 35 36 37 38 39 40 41 42 43 44 45 46 47 48 49 50 51 52 53 54 55 56 57 58 59 60 61
    62 63
);
block!(block_2 => block_3;
    64 65 66 67 68 69 70 71 72 73 74 75 76 77 78 79 80 81 82 83 84 85 86 87 88 89 90 91 92 93
    94 95
);
block!(block_3 => block_4;
    96 97 98 99 100 101 102 103 104 105 106 107 108 109 110 111 112 113 114 115 116 117 118 119
    120 121 122 123 124 125 126 127
);
block!(block_4 => block_5;
    128 129 130 131 132 133 134 135 136 137 138 139 140 141 142 143 144 145 146 147 148 149 150
    151 152 153 154 155 156 157 158 159
);
block!(block_5 => block_6;
    160 161 162 163 164 165 166 167 168 169 170 171 172 173 174 175 176 177 178 179 180 181 182
    183 184 185 186 187 188 189 190 191
);
block!(block_6 => block_7;
    192 193 194 195 196 197 198 199 200 201 202 203 204 205 206 207 208 209 210 211 212 213 214
    215 216 217 218 219 220 221 222 223
);
block!(block_7 => block_end;
    224 225 226 227 228 229 230 231 232 233 234 235 236 237 238 239 240 241 242 243 244 245 246
    247 248 249 250 251 252 253 254 255
);

/// End of the dispatch chain.
#[inline]
fn block_end<const N: usize, F: IndexFn>(index: usize, _f: F) -> F::Output {
    out_of_range(index, N)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl IndexFn for Echo {
        type Output = usize;

        fn call<const J: usize>(self) -> usize {
            J
        }
    }

    #[test]
    fn test_every_index_reaches_its_case() {
        for i in 0..128 {
            assert_eq!(dispatch_index::<128, _>(i, Echo), i);
        }
        for i in 0..MAX {
            assert_eq!(dispatch_index::<MAX, _>(i, Echo), i);
        }
        assert_eq!(dispatch_index::<1, _>(0, Echo), 0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_panics() {
        dispatch_index::<40, _>(40, Echo);
    }

    struct Tags;

    // The array length encodes the index.
    impl Factory for Tags {
        type Out<const J: usize> = [u8; J];

        fn make<const J: usize>(&mut self) -> [u8; J] {
            [0; J]
        }
    }

    struct Measure;

    impl Route<Tags> for Measure {
        type Output = usize;

        fn route<const J: usize>(self, value: [u8; J]) -> usize {
            value.len()
        }
    }

    #[test]
    fn test_two_stage_dispatch() {
        for i in 0..42 {
            assert_eq!(dispatch::<42, _, _>(i, Tags, Measure), i);
        }
    }
}
